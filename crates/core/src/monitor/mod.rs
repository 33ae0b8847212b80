//! Upload progress tracking.
//!
//! A single owner task ([`ProgressMonitor`]) holds the tracker registry. Its
//! inputs all arrive on one ordered channel:
//! - the batch loop registers submitted uploads and seals the batch through a
//!   [`MonitorHandle`]
//! - the event forwarder decodes client file updates into [`FileEvent`]s
//!
//! When the batch is sealed and no tracked upload remains, the monitor fires
//! the one-shot completion signal.

mod completion;
mod config;
mod forwarder;
mod handle;
mod runner;
mod types;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::chat_client::ChatClient;

pub use completion::{completion_signal, CompletionSignal, CompletionWaiter};
pub use config::MonitorConfig;
pub use forwarder::{spawn_event_forwarder, ReadySignal};
pub use handle::MonitorHandle;
pub use runner::{create_progress_monitor, ProgressMonitor};
pub use types::{
    FileEvent, MonitorCommand, MonitorError, ObservationCallback, ProgressTracker,
    UploadObservation,
};

/// A running monitor: its handle, readiness and completion signals, and tasks.
pub struct MonitorRuntime {
    handle: MonitorHandle,
    ready: Option<ReadySignal>,
    completion: Option<CompletionWaiter>,
    monitor_task: JoinHandle<()>,
    forwarder_task: JoinHandle<()>,
}

impl MonitorRuntime {
    pub fn handle(&self) -> &MonitorHandle {
        &self.handle
    }

    /// Wait until the event forwarder is subscribed.
    pub async fn wait_ready(&mut self) -> Result<(), MonitorError> {
        match self.ready.take() {
            Some(ready) => ready.wait().await,
            None => Ok(()),
        }
    }

    /// Wait until the sealed batch has drained.
    pub async fn wait_drained(&mut self) -> Result<(), MonitorError> {
        match self.completion.take() {
            Some(completion) => completion.wait().await,
            None => Ok(()),
        }
    }

    /// Stop both background tasks.
    pub fn shutdown(self) {
        self.forwarder_task.abort();
        self.monitor_task.abort();
    }
}

/// Spawn the progress monitor and the event forwarder feeding it.
///
/// Call [`MonitorRuntime::wait_ready`] before submitting the first upload.
pub fn start_monitor(
    client: Arc<dyn ChatClient>,
    config: &MonitorConfig,
    on_observation: Option<ObservationCallback>,
) -> MonitorRuntime {
    let (handle, monitor, completion) = create_progress_monitor(config, on_observation);
    let monitor_task = tokio::spawn(monitor.run());
    let (ready, forwarder_task) = spawn_event_forwarder(client, handle.clone());

    MonitorRuntime {
        handle,
        ready: Some(ready),
        completion: Some(completion),
        monitor_task,
        forwarder_task,
    }
}
