use std::path::{Path, PathBuf};

use anyhow::Context;
use walkdir::WalkDir;

/// Extension of scenario map files, compared case-insensitively.
pub const SCENARIO_EXTENSION: &str = "h3m";

/// Every scenario file under `maps_dir`, at any depth, sorted by path.
pub fn discover_scenarios(maps_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !maps_dir.is_dir() {
        anyhow::bail!("Maps directory '{}' does not exist", maps_dir.display());
    }

    let mut scenarios = Vec::new();
    for entry in WalkDir::new(maps_dir).follow_links(true) {
        let entry = entry
            .with_context(|| format!("Failed to list maps under '{}'", maps_dir.display()))?;
        if entry.file_type().is_file() && is_scenario(entry.path()) {
            scenarios.push(entry.into_path());
        }
    }
    scenarios.sort();

    log::debug!(
        "Found {} scenario(s) under '{}'",
        scenarios.len(),
        maps_dir.display()
    );
    Ok(scenarios)
}

fn is_scenario(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SCENARIO_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_nested_scenarios_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let maps = dir.path();
        std::fs::create_dir_all(maps.join("ai/late")).unwrap();
        std::fs::write(maps.join("zeta.h3m"), b"").unwrap();
        std::fs::write(maps.join("ai/late/Beta.H3M"), b"").unwrap();
        std::fs::write(maps.join("alpha.h3m"), b"").unwrap();
        std::fs::write(maps.join("readme.txt"), b"").unwrap();
        std::fs::write(maps.join("ai/campaign.h3c"), b"").unwrap();

        let found = discover_scenarios(maps).unwrap();

        assert_eq!(
            found,
            vec![
                maps.join("ai/late/Beta.H3M"),
                maps.join("alpha.h3m"),
                maps.join("zeta.h3m"),
            ]
        );
    }

    #[test]
    fn directories_named_like_scenarios_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("odd.h3m")).unwrap();

        assert!(discover_scenarios(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_maps_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        let err = discover_scenarios(&dir.path().join("Mods/Maps")).unwrap_err();

        assert!(err.to_string().contains("does not exist"));
    }
}
