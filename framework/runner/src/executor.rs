use std::future::Future;

use vcmi_autotest_core::prelude::{InterruptHandle, InterruptedError};

/// Owns the async runtime the driver uses to wait on engine processes.
#[derive(Debug)]
pub struct Executor {
    runtime: tokio::runtime::Runtime,
    interrupt_handle: InterruptHandle,
}

impl Executor {
    pub fn new(runtime: tokio::runtime::Runtime, interrupt_handle: InterruptHandle) -> Self {
        Self {
            runtime,
            interrupt_handle,
        }
    }

    pub fn interrupt_handle(&self) -> &InterruptHandle {
        &self.interrupt_handle
    }

    /// Run async code in place, blocking until it completes.
    ///
    /// The future is dropped and [`InterruptedError`] returned if the operator interrupts the
    /// driver first. Callers that started a process inside the future are responsible for killing
    /// it afterwards.
    pub fn execute_in_place<T>(
        &self,
        fut: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        let mut interrupt_listener = self.interrupt_handle.new_listener();
        self.runtime.block_on(async move {
            tokio::select! {
                result = fut => result,
                _ = interrupt_listener.wait_for_interrupt() => {
                    Err(anyhow::anyhow!(InterruptedError::default()))
                },
            }
        })
    }

    /// Run async code to completion, ignoring interrupts. Use this for cleanup.
    pub fn block_on<T>(&self, fut: impl Future<Output = T>) -> T {
        self.runtime.block_on(fut)
    }
}
