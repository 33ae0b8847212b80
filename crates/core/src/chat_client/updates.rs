//! Fan-out of file-update notifications to subscribers.
//!
//! Progress updates go through a bounded broadcast channel, so a slow subscriber
//! may skip some of them. Completion and failure updates go through one unbounded
//! queue per subscriber and are never dropped.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tracing::warn;

use super::types::FileUpdate;

/// Publishing side shared by a client and its upload tasks.
#[derive(Debug, Clone)]
pub struct FileUpdateHub {
    progress: broadcast::Sender<FileUpdate>,
    terminal: Arc<Mutex<Vec<mpsc::UnboundedSender<FileUpdate>>>>,
}

impl FileUpdateHub {
    /// Create a hub buffering up to `progress_capacity` progress updates per subscriber.
    pub fn new(progress_capacity: usize) -> Self {
        let (progress, _) = broadcast::channel(progress_capacity.max(1));
        Self {
            progress,
            terminal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Subscribe to updates published after this call.
    pub fn subscribe(&self) -> FileUpdateReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let progress = self.progress.subscribe();
        self.senders().push(tx);

        FileUpdateReceiver {
            progress,
            progress_closed: false,
            terminal: rx,
        }
    }

    /// Publish an update. Returns how many subscribers it reached.
    pub fn publish(&self, update: FileUpdate) -> usize {
        if update.is_terminal() {
            let mut senders = self.senders();
            senders.retain(|tx| tx.send(update.clone()).is_ok());
            senders.len()
        } else {
            self.progress.send(update).unwrap_or(0)
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut senders = self.senders();
        senders.retain(|tx| !tx.is_closed());
        senders.len()
    }

    fn senders(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<FileUpdate>>> {
        self.terminal.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Receiving side of a [`FileUpdateHub`] subscription.
#[derive(Debug)]
pub struct FileUpdateReceiver {
    progress: broadcast::Receiver<FileUpdate>,
    progress_closed: bool,
    terminal: mpsc::UnboundedReceiver<FileUpdate>,
}

impl FileUpdateReceiver {
    /// Receive the next update, or `None` once the hub is gone.
    ///
    /// Buffered progress is handed out before a terminal update, so an upload's
    /// completion never overtakes its own progress reports.
    pub async fn recv(&mut self) -> Option<FileUpdate> {
        loop {
            tokio::select! {
                biased;

                progress = self.progress.recv(), if !self.progress_closed => match progress {
                    Ok(update) => return Some(update),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Skipped {} progress update(s) from a slow subscriber", skipped);
                    }
                    Err(RecvError::Closed) => self.progress_closed = true,
                },
                terminal = self.terminal.recv() => return terminal,
            }
        }
    }
}
