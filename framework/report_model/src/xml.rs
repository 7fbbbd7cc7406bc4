use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;

use crate::ScenarioResult;

const OPENING_TAG: &str = "<testrun>";
const CLOSING_TAG: &str = "</testrun>";

/// Writes the `<testrun>` report incrementally.
///
/// The opening tag is written on creation, each [`ScenarioResult`] is flushed as soon as it is
/// appended so a crashed run still leaves every finished scenario on disk, and the closing tag is
/// written by [`XmlReportWriter::finish`].
#[derive(Debug)]
pub struct XmlReportWriter<W: Write> {
    writer: W,
}

impl XmlReportWriter<BufWriter<File>> {
    /// Create (or truncate) the report file at `path` and write the opening tag.
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report file '{}'", path.display()))?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> XmlReportWriter<W> {
    pub fn new(mut writer: W) -> anyhow::Result<Self> {
        writeln!(writer, "{OPENING_TAG}").context("Failed to write report header")?;
        writer.flush()?;

        Ok(Self { writer })
    }

    /// A failed append leaves the report open, later entries and the closing tag can still be
    /// written.
    pub fn append(&mut self, result: &ScenarioResult) -> anyhow::Result<()> {
        // One write per entry, so a failure cannot leave half a line behind
        let line = format!(
            "  <test name=\"{}\" result=\"{}\" />\n",
            escape_attribute(&result.name),
            if result.success { "True" } else { "False" }
        );
        self.writer
            .write_all(line.as_bytes())
            .with_context(|| format!("Failed to write report entry for '{}'", result.name))?;
        self.writer.flush()?;

        Ok(())
    }

    /// Write the closing tag and hand back the underlying writer.
    pub fn finish(mut self) -> anyhow::Result<W> {
        write!(self.writer, "{CLOSING_TAG}").context("Failed to write report footer")?;
        self.writer.flush()?;

        Ok(self.writer)
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
