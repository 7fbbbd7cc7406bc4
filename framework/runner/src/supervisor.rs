use std::time::Duration;

use vcmi_autotest_core::prelude::{InterruptedError, ProcessTimeoutError};

use crate::cli::DEFAULT_SERVER_NAME;
use crate::client::{ClientInvocation, ClientLauncher, ClientProcess};
use crate::process::ProcessControl;

#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// How long the client may run before it is killed.
    pub client_timeout: Duration,
    /// Launches allowed for one scenario.
    pub max_attempts: u32,
    /// Name of the companion server process swept after every launch.
    pub server_name: String,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            client_timeout: Duration::from_secs(60),
            max_attempts: 3,
            server_name: DEFAULT_SERVER_NAME.to_string(),
        }
    }
}

/// What happened to one launch of the engine client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAttempt {
    /// `false` if the client could not be started at all.
    pub launched: bool,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ProcessAttempt {
    fn not_launched() -> Self {
        Self {
            launched: false,
            exit_code: None,
            timed_out: false,
        }
    }

    fn exited(exit_code: Option<i32>) -> Self {
        Self {
            launched: true,
            exit_code,
            timed_out: false,
        }
    }

    fn timed_out() -> Self {
        Self {
            launched: true,
            exit_code: None,
            timed_out: true,
        }
    }

    /// Only gates the retry loop. A clean exit does not mean the tracked player won.
    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Supervision {
    pub attempts: Vec<ProcessAttempt>,
    /// The operator interrupted the driver during one of the attempts.
    pub interrupted: bool,
}

/// Runs the launch, wait, kill cycle for a scenario until the client exits cleanly or the attempt
/// budget is spent.
///
/// Every failure on the way is logged and absorbed. When [`ProcessSupervisor::supervise`] returns
/// no client or server process started for the scenario is still running.
pub struct ProcessSupervisor {
    launcher: Box<dyn ClientLauncher>,
    processes: Box<dyn ProcessControl>,
    settings: SupervisorSettings,
}

impl ProcessSupervisor {
    pub fn new(
        launcher: Box<dyn ClientLauncher>,
        processes: Box<dyn ProcessControl>,
        settings: SupervisorSettings,
    ) -> Self {
        Self {
            launcher,
            processes,
            settings,
        }
    }

    pub fn supervise(&mut self, invocation: &ClientInvocation) -> Supervision {
        let mut supervision = Supervision::default();

        for attempt_number in 1..=self.settings.max_attempts {
            log::debug!(
                "Starting engine client, attempt {attempt_number}/{}",
                self.settings.max_attempts
            );

            let (attempt, interrupted) = self.run_attempt(invocation);
            // The server is detached from the client and would hold on to the log and ports.
            self.terminate_servers();

            log::debug!("Attempt {attempt_number} finished: {attempt:?}");
            supervision.attempts.push(attempt);

            if interrupted {
                supervision.interrupted = true;
                break;
            }
            if attempt.exited_cleanly() {
                break;
            }
        }

        supervision
    }

    fn run_attempt(&mut self, invocation: &ClientInvocation) -> (ProcessAttempt, bool) {
        let mut client = match self.launcher.launch(invocation) {
            Ok(client) => client,
            Err(e) if e.is::<InterruptedError>() => {
                log::warn!("Interrupted before the engine client was started");
                return (ProcessAttempt::not_launched(), true);
            }
            Err(e) => {
                log::error!("Failed to start engine client: {e:?}");
                return (ProcessAttempt::not_launched(), false);
            }
        };

        match client.wait_for_exit(self.settings.client_timeout) {
            Ok(exit_code) => (ProcessAttempt::exited(exit_code), false),
            Err(e) if e.is::<ProcessTimeoutError>() => {
                log::warn!("{e}, killing it");
                kill_client(client.as_mut());
                (ProcessAttempt::timed_out(), false)
            }
            Err(e) if e.is::<InterruptedError>() => {
                log::warn!("Interrupted while the engine client was running, killing it");
                kill_client(client.as_mut());
                (ProcessAttempt::exited(None), true)
            }
            Err(e) => {
                log::error!("Lost track of the engine client: {e:?}");
                kill_client(client.as_mut());
                (ProcessAttempt::exited(None), false)
            }
        }
    }

    fn terminate_servers(&mut self) {
        let server_name = &self.settings.server_name;
        for pid in self.processes.list_by_name(server_name) {
            log::debug!("Terminating engine server '{server_name}' ({pid})");
            if !self.processes.terminate(pid) {
                log::trace!("Engine server {pid} had already exited");
            }
            self.processes.await_exit(pid);
        }
    }
}

fn kill_client(client: &mut dyn ClientProcess) {
    if let Err(e) = client.kill() {
        // Usually means it exited on its own just before the kill.
        log::warn!("Failed to kill engine client: {e:?}");
    }
}
