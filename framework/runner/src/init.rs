use crate::cli::DriverCli;
use clap::Parser;

/// Initialise the CLI and logging for the test driver.
pub fn init() -> DriverCli {
    env_logger::init();

    DriverCli::parse()
}
