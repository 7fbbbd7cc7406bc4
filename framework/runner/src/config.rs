use std::path::PathBuf;
use std::time::Duration;

use crate::artifacts::ArtifactSettings;
use crate::cli::{DriverCli, DEFAULT_CLIENT_NAME, DEFAULT_SERVER_NAME};
use crate::client::EngineTarget;
use crate::outcome::{PollBudget, DEFAULT_TAIL_WINDOW};
use crate::supervisor::SupervisorSettings;

/// Log files archived for a failed scenario when none are configured.
pub const DEFAULT_ARTIFACTS: [&str; 2] = ["VCMI_Client_log.txt", "VCMI_Server_log.txt"];

/// Prefix the engine expects in front of a map name passed to `--testmap`.
pub const DEFAULT_MAP_PREFIX: &str = "MAPS/";

/// Name of the directory, inside the result directory, used to stage artifacts.
pub const RESULT_TEMP_DIR_NAME: &str = "current";

/// Name of the JSON lines file, inside the result directory, that receives the run summary.
pub const RUN_SUMMARY_FILE_NAME: &str = "run_summary.jsonl";

/// Everything the driver needs to know about its environment, resolved once at startup and
/// passed down to each component.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub vcmi_root_dir: PathBuf,
    pub saves_dir: PathBuf,
    pub result_file_name: String,
    pub maps_mod_base_path: PathBuf,
    pub result_directory: PathBuf,
    pub client_name: String,
    pub server_name: String,
    pub client_log_name: String,
    pub artifacts: Vec<String>,
    pub map_prefix: String,
    pub client_timeout: Duration,
    pub max_attempts: u32,
    pub poll_budget: PollBudget,
    pub tail_window: u64,
    pub no_progress: bool,
}

impl DriverConfig {
    /// Configuration with the default layout for a VCMI install at `vcmi_root_dir` writing its
    /// logs to `saves_dir`.
    pub fn new(vcmi_root_dir: impl Into<PathBuf>, saves_dir: impl Into<PathBuf>) -> Self {
        Self {
            vcmi_root_dir: vcmi_root_dir.into(),
            saves_dir: saves_dir.into(),
            result_file_name: "result.xml".to_string(),
            maps_mod_base_path: PathBuf::from("Mods/Maps"),
            result_directory: PathBuf::from("result"),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            client_log_name: DEFAULT_ARTIFACTS[0].to_string(),
            artifacts: DEFAULT_ARTIFACTS.iter().map(|s| s.to_string()).collect(),
            map_prefix: DEFAULT_MAP_PREFIX.to_string(),
            client_timeout: Duration::from_secs(60),
            max_attempts: 3,
            poll_budget: PollBudget::default(),
            tail_window: DEFAULT_TAIL_WINDOW,
            no_progress: false,
        }
    }

    pub fn maps_dir(&self) -> PathBuf {
        self.vcmi_root_dir.join(&self.maps_mod_base_path)
    }

    pub fn client_path(&self) -> PathBuf {
        self.vcmi_root_dir.join(&self.client_name)
    }

    pub fn client_log_path(&self) -> PathBuf {
        self.saves_dir.join(&self.client_log_name)
    }

    pub fn results_path(&self, relative: &str) -> PathBuf {
        self.result_directory.join(relative)
    }

    pub fn report_path(&self) -> PathBuf {
        self.results_path(&self.result_file_name)
    }

    pub fn result_temp_dir(&self) -> PathBuf {
        self.results_path(RESULT_TEMP_DIR_NAME)
    }

    pub fn engine_target(&self) -> EngineTarget {
        EngineTarget {
            program: self.client_path(),
            working_dir: self.vcmi_root_dir.clone(),
            map_prefix: self.map_prefix.clone(),
        }
    }

    pub fn supervisor_settings(&self) -> SupervisorSettings {
        SupervisorSettings {
            client_timeout: self.client_timeout,
            max_attempts: self.max_attempts,
            server_name: self.server_name.clone(),
        }
    }

    pub fn artifact_settings(&self) -> ArtifactSettings {
        ArtifactSettings {
            source_dir: self.saves_dir.clone(),
            file_names: self.artifacts.clone(),
            staging_dir: self.result_temp_dir(),
            output_dir: self.result_directory.clone(),
        }
    }
}

impl From<DriverCli> for DriverConfig {
    fn from(cli: DriverCli) -> Self {
        let mut config = DriverConfig::new(cli.vcmi_root_dir, cli.saves_dir);
        config.result_file_name = cli.result_file_name;
        config.maps_mod_base_path = PathBuf::from(cli.maps_mod_base_path);
        config.result_directory = PathBuf::from(cli.result_directory);
        config.client_name = cli.vcmi_client_name;
        config.server_name = cli.vcmi_server_name;
        config.client_log_name = cli.client_log_name;
        if !cli.artifacts.is_empty() {
            config.artifacts = cli.artifacts;
        }
        config.client_timeout = Duration::from_secs(cli.client_timeout);
        config.max_attempts = cli.max_attempts;
        config.poll_budget = PollBudget {
            attempts: cli.poll_attempts,
            interval: Duration::from_millis(cli.poll_interval_ms),
        };
        config.no_progress = cli.no_progress;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[cfg(unix)]
    #[test]
    fn paths_are_resolved_against_configured_roots() {
        let mut config = DriverConfig::new("/opt/vcmi", "/saves");
        config.result_directory = PathBuf::from("/out");

        assert_eq!(config.maps_dir(), PathBuf::from("/opt/vcmi/Mods/Maps"));
        assert_eq!(
            config.client_path(),
            PathBuf::from("/opt/vcmi").join(DEFAULT_CLIENT_NAME)
        );
        assert_eq!(
            config.client_log_path(),
            PathBuf::from("/saves/VCMI_Client_log.txt")
        );
        assert_eq!(config.report_path(), PathBuf::from("/out/result.xml"));
        assert_eq!(config.result_temp_dir(), PathBuf::from("/out/current"));
    }

    #[test]
    fn cli_overrides_are_applied() {
        let cli = DriverCli::parse_from([
            "vcmi-autotest-driver",
            "--vcmi-root-dir",
            "root",
            "--saves-dir",
            "saves",
            "--client-timeout",
            "5",
            "--poll-attempts",
            "4",
            "--poll-interval-ms",
            "25",
            "--artifact",
            "only.txt",
            "--no-progress",
        ]);

        let config = DriverConfig::from(cli);

        assert_eq!(config.client_timeout, Duration::from_secs(5));
        assert_eq!(config.poll_budget.attempts, 4);
        assert_eq!(config.poll_budget.interval, Duration::from_millis(25));
        assert_eq!(config.poll_budget.total(), Duration::from_millis(100));
        assert_eq!(config.artifacts, vec!["only.txt".to_string()]);
        assert!(config.no_progress);
    }

    #[test]
    fn oversized_poll_settings_do_not_overflow() {
        let cli = DriverCli::parse_from([
            "vcmi-autotest-driver",
            "--vcmi-root-dir",
            "root",
            "--saves-dir",
            "saves",
            "--poll-attempts",
            "2",
            "--poll-interval-ms",
            "18446744073709551615",
        ]);

        let config = DriverConfig::from(cli);

        assert_eq!(config.poll_budget.total(), Duration::MAX);
    }

    #[test]
    fn default_artifacts_are_kept_when_none_given() {
        let cli = DriverCli::parse_from([
            "vcmi-autotest-driver",
            "--vcmi-root-dir",
            "root",
            "--saves-dir",
            "saves",
        ]);

        let config = DriverConfig::from(cli);

        assert_eq!(config.artifacts, DEFAULT_ARTIFACTS.to_vec());
    }
}
