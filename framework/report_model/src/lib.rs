use serde::{Deserialize, Serialize};

mod summary;
mod xml;

pub use summary::{append_run_summary, load_summary_runs, store_run_summary, RunSummary};
pub use xml::XmlReportWriter;

/// Result of a single scenario as it appears in every report format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScenarioResult {
    /// Display name decoded from the scenario, or the file stem if it could not be decoded.
    pub name: String,
    /// Whether the tracked player won.
    pub success: bool,
}

impl ScenarioResult {
    pub fn new(name: impl Into<String>, success: bool) -> Self {
        Self {
            name: name.into(),
            success,
        }
    }
}
