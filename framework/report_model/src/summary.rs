use std::io::{BufRead, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ScenarioResult;

/// Summary of one batch run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the driver. Unique for each run.
    pub run_id: String,
    /// The time the run started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// The number of scenarios discovered in the catalog
    ///
    /// This can be more than the length of [RunSummary::results] if the run was interrupted.
    pub scenario_count: usize,
    /// One entry per scenario that was run, in the order they were run
    pub results: Vec<ScenarioResult>,
    /// Set when the operator stopped the run before every scenario had been run
    pub interrupted: bool,
    /// The version of the driver that produced this run
    pub driver_version: String,
}

impl RunSummary {
    /// Create a new run summary with no results yet
    pub fn new(
        run_id: String,
        started_at: i64,
        scenario_count: usize,
        driver_version: String,
    ) -> Self {
        Self {
            run_id,
            started_at,
            scenario_count,
            results: Vec::with_capacity(scenario_count),
            interrupted: false,
            driver_version,
        }
    }

    /// Record the result of a scenario
    pub fn add_result(&mut self, result: ScenarioResult) {
        self.results.push(result);
    }

    /// Mark the run as stopped before the catalog was exhausted
    pub fn set_interrupted(&mut self) {
        self.interrupted = true;
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }
}

/// Append the run summary to a file
///
/// The summary will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_run_summary(run_summary: &RunSummary, path: &Path) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_summary)?;
    Ok(())
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_summary].
pub fn load_summary_runs(path: &Path) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let run: RunSummary = serde_json::from_str(&line)?;
        runs.push(run);
    }
    Ok(runs)
}
