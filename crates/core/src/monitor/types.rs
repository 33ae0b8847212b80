//! Types for the progress monitor.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::chat_client::{FileId, FileUpdate};

/// Errors surfaced by the monitor's handles.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Progress monitor channel is closed")]
    Closed,

    #[error("Progress monitor stopped before signalling")]
    Stopped,
}

/// A file-update notification decoded once at the client boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// Transfer in progress.
    Uploading {
        file_id: FileId,
        uploaded: u64,
        expected: u64,
    },
    /// Transfer finished; the file now has a remote identity.
    Completed { file_id: FileId, unique_id: String },
    /// Transfer abandoned by the client.
    Failed { file_id: FileId, reason: String },
    /// Anything the monitor does not act on.
    Other,
}

impl From<&FileUpdate> for FileEvent {
    fn from(update: &FileUpdate) -> Self {
        if let Some(reason) = &update.error {
            return FileEvent::Failed {
                file_id: update.id,
                reason: reason.clone(),
            };
        }

        match &update.remote {
            Some(remote) if remote.is_uploading_completed => FileEvent::Completed {
                file_id: update.id,
                unique_id: remote.unique_id.clone(),
            },
            Some(remote) if remote.is_uploading_active => FileEvent::Uploading {
                file_id: update.id,
                uploaded: remote.uploaded_size,
                expected: update.expected_size,
            },
            _ => FileEvent::Other,
        }
    }
}

/// Input to the monitor's owner task.
#[derive(Debug, Clone)]
pub enum MonitorCommand {
    /// A video was submitted and is now in flight under `file_id`.
    Register { file_id: FileId, video_path: PathBuf },
    /// A decoded event from the client's stream.
    Observed(FileEvent),
    /// No further registrations will follow.
    Seal,
}

/// In-memory record of one in-flight upload.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    pub file_id: FileId,
    pub video_path: PathBuf,
    /// `None` until the first progress report, so that report is never throttled.
    pub last_update: Option<Instant>,
}

impl ProgressTracker {
    pub fn new(file_id: FileId, video_path: PathBuf) -> Self {
        Self {
            file_id,
            video_path,
            last_update: None,
        }
    }

    /// Whether a progress report at `now` is outside the throttle window.
    pub fn should_report(&self, now: Instant, interval: Duration) -> bool {
        match self.last_update {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= interval,
        }
    }
}

/// Something the monitor reports about a tracked upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadObservation {
    Progress {
        file_id: FileId,
        video_path: PathBuf,
        uploaded: u64,
        expected: u64,
    },
    Completed {
        file_id: FileId,
        video_path: PathBuf,
        unique_id: String,
    },
    Failed {
        file_id: FileId,
        video_path: PathBuf,
        reason: String,
    },
}

/// Callback invoked for every observation.
pub type ObservationCallback = Arc<dyn Fn(&UploadObservation) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_client::RemoteFile;

    #[test]
    fn test_decode_uploading() {
        let event = FileEvent::from(&FileUpdate::uploading(3, 40, 100));
        assert_eq!(
            event,
            FileEvent::Uploading {
                file_id: 3,
                uploaded: 40,
                expected: 100
            }
        );
    }

    #[test]
    fn test_decode_completed() {
        let event = FileEvent::from(&FileUpdate::completed(3, "AgADxyz", 100));
        assert_eq!(
            event,
            FileEvent::Completed {
                file_id: 3,
                unique_id: "AgADxyz".to_string()
            }
        );
    }

    #[test]
    fn test_decode_failed_wins_over_remote_state() {
        let mut update = FileUpdate::uploading(5, 10, 100);
        update.error = Some("HTTP 413".to_string());
        assert!(matches!(
            FileEvent::from(&update),
            FileEvent::Failed { file_id: 5, .. }
        ));
    }

    #[test]
    fn test_decode_idle_remote_is_other() {
        let update = FileUpdate {
            id: 9,
            expected_size: 10,
            remote: Some(RemoteFile::default()),
            error: None,
        };
        assert_eq!(FileEvent::from(&update), FileEvent::Other);

        let bare = FileUpdate {
            id: 9,
            expected_size: 10,
            remote: None,
            error: None,
        };
        assert_eq!(FileEvent::from(&bare), FileEvent::Other);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tracker_throttle_window() {
        let interval = Duration::from_secs(1);
        let mut tracker = ProgressTracker::new(1, PathBuf::from("a.mp4"));
        let start = Instant::now();
        assert!(tracker.should_report(start, interval));

        tracker.last_update = Some(start);
        assert!(!tracker.should_report(start + Duration::from_millis(999), interval));
        assert!(tracker.should_report(start + interval, interval));
    }
}
