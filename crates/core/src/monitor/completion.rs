use tokio::sync::oneshot;

use super::MonitorError;

/// Create a linked completion signal and waiter.
pub fn completion_signal() -> (CompletionSignal, CompletionWaiter) {
    let (tx, rx) = oneshot::channel();
    (CompletionSignal { tx: Some(tx) }, CompletionWaiter { rx })
}

/// Firing side of the one-shot "all uploads finished" notification.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: Option<oneshot::Sender<()>>,
}

impl CompletionSignal {
    /// Fire the signal. Returns false if it had already fired.
    ///
    /// The value is buffered, so a waiter that starts waiting afterwards
    /// still returns immediately.
    pub fn fire(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => {
                // The waiter may have been dropped; nothing to do then
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.tx.is_none()
    }
}

/// Waiting side of the completion notification.
#[derive(Debug)]
pub struct CompletionWaiter {
    rx: oneshot::Receiver<()>,
}

impl CompletionWaiter {
    /// Wait until the signal fires.
    ///
    /// Fails if the signal is dropped without firing (the monitor stopped).
    pub async fn wait(self) -> Result<(), MonitorError> {
        self.rx.await.map_err(|_| MonitorError::Stopped)
    }
}
