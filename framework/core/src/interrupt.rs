use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, Receiver, Sender};

/// Shared handle used to tell every part of the driver that the operator wants it to stop.
///
/// The interrupt is sticky. Once [`InterruptHandle::interrupt`] has been called, every existing
/// and future listener reports it, so the batch loop can check between scenarios without racing
/// the signal.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    sender: Sender<()>,
    interrupted: Arc<AtomicBool>,
}

impl Default for InterruptHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptHandle {
    pub fn new() -> Self {
        Self {
            sender: broadcast::channel(1).0,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        if let Err(e) = self.sender.send(()) {
            // Nobody is waiting right now, the flag is enough for later checks.
            log::debug!("No interrupt listeners waiting: {e:?}");
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn new_listener(&self) -> InterruptListener {
        InterruptListener {
            receiver: self.sender.subscribe(),
            interrupted: self.interrupted.clone(),
        }
    }
}

#[derive(Debug)]
pub struct InterruptListener {
    receiver: Receiver<()>,
    interrupted: Arc<AtomicBool>,
}

impl InterruptListener {
    /// Point in time check for the interrupt.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Resolves once the interrupt has been raised. Safe to race against other futures so that
    /// the interrupt cancels them.
    pub async fn wait_for_interrupt(&mut self) {
        if self.is_interrupted() {
            return;
        }

        match self.receiver.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => {}
            // Every handle is gone so nothing can interrupt us any more.
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_is_sticky_for_existing_and_new_listeners() {
        let handle = InterruptHandle::new();
        let before = handle.new_listener();
        assert!(!before.is_interrupted());

        handle.interrupt();

        assert!(before.is_interrupted());
        assert!(before.is_interrupted());
        assert!(handle.new_listener().is_interrupted());
        assert!(handle.is_interrupted());
    }

    #[tokio::test]
    async fn wait_returns_after_interrupt() {
        let handle = InterruptHandle::new();
        let mut listener = handle.new_listener();

        let trigger = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            trigger.interrupt();
        });

        tokio::time::timeout(
            std::time::Duration::from_secs(5),
            listener.wait_for_interrupt(),
        )
        .await
        .expect("listener should observe the interrupt");
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_already_interrupted() {
        let handle = InterruptHandle::new();
        handle.interrupt();

        let mut listener = handle.new_listener();
        listener.wait_for_interrupt().await;
    }
}
