//! Bridges the client's file-update stream into the monitor.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::chat_client::ChatClient;

use super::handle::MonitorHandle;
use super::types::{FileEvent, MonitorError};

/// Resolves once the forwarder is subscribed to the client's event stream.
#[derive(Debug)]
pub struct ReadySignal {
    rx: oneshot::Receiver<()>,
}

impl ReadySignal {
    pub async fn wait(self) -> Result<(), MonitorError> {
        self.rx.await.map_err(|_| MonitorError::Stopped)
    }
}

/// Spawn the task that decodes file updates and forwards them to the monitor.
///
/// Completion and failure updates published after the returned [`ReadySignal`]
/// resolves are never missed. Progress updates may be skipped when the task
/// falls behind the client's buffer. The task ends when the client's stream closes or the monitor
/// stops accepting commands.
pub fn spawn_event_forwarder(
    client: Arc<dyn ChatClient>,
    handle: MonitorHandle,
) -> (ReadySignal, JoinHandle<()>) {
    let (ready_tx, ready_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let mut updates = client.subscribe_file_updates();
        let _ = ready_tx.send(());
        tracing::debug!("Subscribed to {} file updates", client.name());

        while let Some(update) = updates.recv().await {
            let event = FileEvent::from(&update);
            if event == FileEvent::Other {
                continue;
            }
            if handle.observe(event).await.is_err() {
                tracing::debug!("Progress monitor closed, stopping event forwarder");
                return;
            }
        }
        tracing::debug!("Event stream closed");
    });

    (ReadySignal { rx: ready_rx }, task)
}
