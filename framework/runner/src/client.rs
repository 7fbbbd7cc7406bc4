//! Launching the engine client for a single scenario.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::process::{Child, Command};
use vcmi_autotest_core::prelude::ProcessTimeoutError;

use crate::executor::Executor;

/// Where the engine client lives and how it names maps.
#[derive(Debug, Clone)]
pub struct EngineTarget {
    pub program: PathBuf,
    pub working_dir: PathBuf,
    /// Prepended to the scenario file stem to build the `--testmap` argument.
    pub map_prefix: String,
}

impl EngineTarget {
    pub fn invocation(&self, scenario_path: &Path) -> ClientInvocation {
        let stem = scenario_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        ClientInvocation {
            program: self.program.clone(),
            working_dir: self.working_dir.clone(),
            args: vec![
                "--testmap".to_string(),
                format!("{}{stem}", self.map_prefix),
                "--headless".to_string(),
            ],
        }
    }
}

/// A fully resolved command line for one launch of the engine client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInvocation {
    pub program: PathBuf,
    pub working_dir: PathBuf,
    pub args: Vec<String>,
}

pub trait ClientLauncher {
    fn launch(&self, invocation: &ClientInvocation) -> anyhow::Result<Box<dyn ClientProcess>>;
}

/// A running engine client.
pub trait ClientProcess {
    /// Wait for the client to exit and return its exit code, which is `None` if it was ended by a
    /// signal.
    ///
    /// Fails with [`ProcessTimeoutError`] if the client is still running after `timeout`, or with
    /// [`vcmi_autotest_core::prelude::InterruptedError`] if the driver is interrupted. The client
    /// is left running in both cases.
    fn wait_for_exit(&mut self, timeout: Duration) -> anyhow::Result<Option<i32>>;

    /// Forcibly terminate the client and wait for it to go away.
    fn kill(&mut self) -> anyhow::Result<()>;
}

/// Launches the real engine client as a child process on the driver's [`Executor`].
#[derive(Debug, Clone)]
pub struct EngineClientLauncher {
    executor: Arc<Executor>,
}

impl EngineClientLauncher {
    pub fn new(executor: Arc<Executor>) -> Self {
        Self { executor }
    }
}

impl ClientLauncher for EngineClientLauncher {
    fn launch(&self, invocation: &ClientInvocation) -> anyhow::Result<Box<dyn ClientProcess>> {
        log::debug!(
            "Launching '{}' {:?} in '{}'",
            invocation.program.display(),
            invocation.args,
            invocation.working_dir.display()
        );

        // Spawning has to happen inside the runtime for the child to be reaped by it.
        let child = self.executor.execute_in_place(async {
            Command::new(&invocation.program)
                .args(&invocation.args)
                .current_dir(&invocation.working_dir)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .spawn()
                .with_context(|| {
                    format!(
                        "Failed to launch engine client '{}'",
                        invocation.program.display()
                    )
                })
        })?;

        Ok(Box::new(EngineClient {
            child,
            executor: self.executor.clone(),
        }))
    }
}

struct EngineClient {
    child: Child,
    executor: Arc<Executor>,
}

impl ClientProcess for EngineClient {
    fn wait_for_exit(&mut self, timeout: Duration) -> anyhow::Result<Option<i32>> {
        let child = &mut self.child;
        self.executor.execute_in_place(async move {
            match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => Ok(status
                    .context("Failed to wait for the engine client")?
                    .code()),
                Err(_) => Err(ProcessTimeoutError::new(timeout).into()),
            }
        })
    }

    fn kill(&mut self) -> anyhow::Result<()> {
        let child = &mut self.child;
        self.executor.block_on(async move {
            child
                .kill()
                .await
                .context("Failed to kill the engine client")
        })
    }
}
