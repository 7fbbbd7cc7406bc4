use tokio::signal;
use vcmi_autotest_core::prelude::InterruptHandle;

/// Turn the first Ctrl-C into an interrupt on the returned handle.
pub(crate) fn start_interrupt_listener(runtime: &tokio::runtime::Runtime) -> InterruptHandle {
    let handle = InterruptHandle::default();

    let listener_handle = handle.clone();
    runtime.spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                log::warn!("Received interrupt, stopping after the current scenario is cleaned up");
                listener_handle.interrupt();
            }
            Err(e) => log::error!("Failed to listen for Ctrl-C, interrupts are disabled: {e}"),
        }
    });

    handle
}
