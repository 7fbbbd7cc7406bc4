use clap::Parser;

#[cfg(windows)]
pub const DEFAULT_CLIENT_NAME: &str = "VCMI_client.exe";
#[cfg(not(windows))]
pub const DEFAULT_CLIENT_NAME: &str = "vcmiclient";

#[cfg(windows)]
pub const DEFAULT_SERVER_NAME: &str = "VCMI_server.exe";
#[cfg(not(windows))]
pub const DEFAULT_SERVER_NAME: &str = "vcmiserver";

#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct DriverCli {
    /// Directory containing the VCMI client and server binaries
    #[clap(long)]
    pub vcmi_root_dir: String,

    /// Directory the engine writes its logs to
    #[clap(long)]
    pub saves_dir: String,

    /// Name of the XML report written into the result directory
    #[clap(long, default_value = "result.xml")]
    pub result_file_name: String,

    /// Path to the scenario maps, relative to the VCMI root directory
    #[clap(long, default_value = "Mods/Maps")]
    pub maps_mod_base_path: String,

    /// Directory that receives the report and failure archives. It is wiped at startup.
    #[clap(long, default_value = "result")]
    pub result_directory: String,

    /// File name of the engine client binary inside the VCMI root directory
    #[clap(long, default_value = DEFAULT_CLIENT_NAME)]
    pub vcmi_client_name: String,

    /// Process name of the engine server, every process with this name is killed after each run
    #[clap(long, default_value = DEFAULT_SERVER_NAME)]
    pub vcmi_server_name: String,

    /// Name of the client log file, inside the saves directory, that is scanned for the outcome
    #[clap(long, default_value = "VCMI_Client_log.txt")]
    pub client_log_name: String,

    /// Log file, inside the saves directory, to archive when a scenario fails.
    ///
    /// Can be given multiple times. Defaults to the client and server logs.
    #[clap(long = "artifact")]
    pub artifacts: Vec<String>,

    /// Seconds to wait for the engine client to exit before it is killed
    #[clap(long, default_value = "60")]
    pub client_timeout: u64,

    /// Maximum number of times the engine client is launched for one scenario
    #[clap(long, default_value = "3")]
    pub max_attempts: u32,

    /// Number of times the client log is checked for an outcome before the scenario is failed
    #[clap(long, default_value = "10")]
    pub poll_attempts: u32,

    /// Milliseconds to wait before each check of the client log
    #[clap(long, default_value = "100")]
    pub poll_interval_ms: u64,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_driver_layout() {
        let cli = DriverCli::parse_from([
            "vcmi-autotest-driver",
            "--vcmi-root-dir",
            "/opt/vcmi",
            "--saves-dir",
            "/home/tester/.local/share/vcmi",
        ]);

        assert_eq!(cli.result_file_name, "result.xml");
        assert_eq!(cli.maps_mod_base_path, "Mods/Maps");
        assert_eq!(cli.result_directory, "result");
        assert_eq!(cli.client_timeout, 60);
        assert_eq!(cli.max_attempts, 3);
        assert_eq!(cli.poll_attempts, 10);
        assert_eq!(cli.poll_interval_ms, 100);
        assert!(cli.artifacts.is_empty());
        assert!(!cli.no_progress);
    }

    #[test]
    fn artifacts_can_be_repeated() {
        let cli = DriverCli::parse_from([
            "vcmi-autotest-driver",
            "--vcmi-root-dir",
            "root",
            "--saves-dir",
            "saves",
            "--artifact",
            "a.txt",
            "--artifact",
            "b.txt",
        ]);

        assert_eq!(cli.artifacts, vec!["a.txt".to_string(), "b.txt".to_string()]);
    }

    #[test]
    fn root_and_saves_are_required() {
        let result = DriverCli::try_parse_from(["vcmi-autotest-driver", "--saves-dir", "saves"]);
        assert!(result.is_err());
    }
}
