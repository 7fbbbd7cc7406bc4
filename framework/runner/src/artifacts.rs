use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Where failure artifacts come from and where they end up.
#[derive(Debug, Clone)]
pub struct ArtifactSettings {
    /// Directory the engine writes its logs to.
    pub source_dir: PathBuf,
    /// Files inside `source_dir` to keep.
    pub file_names: Vec<String>,
    /// Per scenario scratch directories are created in here.
    pub staging_dir: PathBuf,
    /// Archives are written here as `<scenario name>.zip`.
    pub output_dir: PathBuf,
}

/// Keeps evidence of a failed scenario.
pub trait ArtifactSink {
    /// Capture artifacts for the scenario called `name`, returning the archive written.
    fn capture(&self, name: &str) -> anyhow::Result<PathBuf>;
}

/// Copies the configured logs into a scratch directory and zips them up.
#[derive(Debug, Clone)]
pub struct ZipArtifactCollector {
    settings: ArtifactSettings,
}

impl ZipArtifactCollector {
    pub fn new(settings: ArtifactSettings) -> Self {
        Self { settings }
    }

    fn stage(&self, staging: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let mut staged = Vec::with_capacity(self.settings.file_names.len());
        for file_name in &self.settings.file_names {
            let source = self.settings.source_dir.join(file_name);
            if !source.is_file() {
                log::warn!("Artifact '{}' does not exist, skipping", source.display());
                continue;
            }

            let target = staging.join(file_name);
            // Copied first so the engine cannot change the file while it is compressed.
            std::fs::copy(&source, &target).with_context(|| {
                format!("Failed to copy artifact '{}'", source.display())
            })?;
            staged.push(target);
        }
        Ok(staged)
    }
}

impl ArtifactSink for ZipArtifactCollector {
    fn capture(&self, name: &str) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.settings.staging_dir).with_context(|| {
            format!(
                "Failed to create staging directory '{}'",
                self.settings.staging_dir.display()
            )
        })?;
        let staging = tempfile::Builder::new()
            .prefix("artifacts-")
            .tempdir_in(&self.settings.staging_dir)
            .context("Failed to create artifact staging directory")?;

        let staged = self.stage(staging.path())?;

        let archive_path = self
            .settings
            .output_dir
            .join(format!("{}.zip", archive_stem(name)));
        write_archive(&archive_path, &staged)?;

        log::info!(
            "Archived {} artifact(s) for '{name}' to '{}'",
            staged.len(),
            archive_path.display()
        );
        Ok(archive_path)
    }
}

fn write_archive(archive_path: &Path, files: &[PathBuf]) -> anyhow::Result<()> {
    let archive = File::create(archive_path)
        .with_context(|| format!("Failed to create archive '{}'", archive_path.display()))?;
    let mut zip = ZipWriter::new(BufWriter::new(archive));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let entry_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("Staged artifact has no file name")?;
        zip.start_file(entry_name, options)?;
        let mut source = File::open(path)
            .with_context(|| format!("Failed to open staged artifact '{}'", path.display()))?;
        std::io::copy(&mut source, &mut zip)?;
    }

    zip.finish()
        .with_context(|| format!("Failed to finish archive '{}'", archive_path.display()))?;
    Ok(())
}

/// Scenario names are free text, keep them from escaping the output directory.
fn archive_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if stem.is_empty() {
        "scenario".to_string()
    } else {
        stem.to_string()
    }
}
