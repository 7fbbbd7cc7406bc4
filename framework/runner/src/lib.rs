mod artifacts;
mod catalog;
mod cli;
mod client;
mod config;
mod container;
mod executor;
mod init;
mod interrupt;
mod outcome;
mod process;
mod progress;
mod run;
mod scenario;
mod supervisor;
mod types;

pub mod prelude {
    pub use crate::artifacts::{ArtifactSettings, ArtifactSink, ZipArtifactCollector};
    pub use crate::catalog::{discover_scenarios, SCENARIO_EXTENSION};
    pub use crate::cli::{DriverCli, DEFAULT_CLIENT_NAME, DEFAULT_SERVER_NAME};
    pub use crate::client::{
        ClientInvocation, ClientLauncher, ClientProcess, EngineClientLauncher, EngineTarget,
    };
    pub use crate::config::{DriverConfig, DEFAULT_ARTIFACTS, RUN_SUMMARY_FILE_NAME};
    pub use crate::container::{
        ContainerField, MalformedScenarioError, ScenarioDescriptor, BLUE_PLAYER_MARKER,
    };
    pub use crate::executor::Executor;
    pub use crate::init::init;
    pub use crate::outcome::{
        FileLogSource, LogAccessError, LogReader, LogSource, OutcomeDetector, PollBudget,
        Verdict, DEFAULT_TAIL_WINDOW,
    };
    pub use crate::process::{ProcessControl, ProcessId, SysinfoProcessControl};
    pub use crate::run::{prepare_result_directory, run, run_batch};
    pub use crate::scenario::{ScenarioRun, ScenarioRunner, ScenarioStatus};
    pub use crate::supervisor::{
        ProcessAttempt, ProcessSupervisor, Supervision, SupervisorSettings,
    };
    pub use crate::types::DriverResult;

    pub use vcmi_autotest_core::prelude::*;
    pub use vcmi_autotest_report_model::{RunSummary, ScenarioResult};
}
