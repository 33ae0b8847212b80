//! Cloneable sender side of the progress monitor.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::chat_client::FileId;

use super::types::{FileEvent, MonitorCommand, MonitorError};

/// Handle for feeding commands to the monitor's owner task.
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,
}

impl MonitorHandle {
    pub(crate) fn new(sender: mpsc::Sender<MonitorCommand>) -> Self {
        Self { sender }
    }

    /// Start tracking an upload.
    pub async fn register(
        &self,
        file_id: FileId,
        video_path: impl Into<PathBuf>,
    ) -> Result<(), MonitorError> {
        self.send(MonitorCommand::Register {
            file_id,
            video_path: video_path.into(),
        })
        .await
    }

    /// Forward a decoded client event.
    pub async fn observe(&self, event: FileEvent) -> Result<(), MonitorError> {
        self.send(MonitorCommand::Observed(event)).await
    }

    /// Declare that no further uploads will be registered.
    pub async fn seal(&self) -> Result<(), MonitorError> {
        self.send(MonitorCommand::Seal).await
    }

    async fn send(&self, command: MonitorCommand) -> Result<(), MonitorError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| MonitorError::Closed)
    }
}
