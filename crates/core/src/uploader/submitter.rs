use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::chat_client::{ChatClient, FileId, InputFile, InputThumbnail, VideoMessage};
use crate::cover::ThumbnailResult;
use crate::monitor::MonitorHandle;
use crate::probe::MediaMetadata;

use super::types::UploadError;

/// Builds the outgoing message for one video.
///
/// Duration is truncated to whole seconds. Dimensions saturate at `i32::MAX`.
pub fn build_video_message(
    video: &Path,
    thumbnail: &ThumbnailResult,
    metadata: &MediaMetadata,
) -> VideoMessage {
    VideoMessage {
        video: InputFile::local(video),
        thumbnail: InputThumbnail {
            file: InputFile::local(&thumbnail.path),
            width: saturating_i32(thumbnail.width),
            height: saturating_i32(thumbnail.height),
        },
        duration: metadata.duration_secs.max(0.0) as i32,
        width: saturating_i32(metadata.width),
        height: saturating_i32(metadata.height),
        supports_streaming: true,
    }
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Submits videos to one chat and hands them to the progress monitor.
pub struct UploadSubmitter {
    client: Arc<dyn ChatClient>,
    chat_id: i64,
    monitor: MonitorHandle,
}

impl UploadSubmitter {
    pub fn new(client: Arc<dyn ChatClient>, chat_id: i64, monitor: MonitorHandle) -> Self {
        Self {
            client,
            chat_id,
            monitor,
        }
    }

    /// Submit one video and register it for tracking.
    ///
    /// Returns once the client has accepted the request, not when the
    /// upload finishes.
    pub async fn submit(
        &self,
        video: &Path,
        thumbnail: &ThumbnailResult,
        metadata: &MediaMetadata,
    ) -> Result<FileId, UploadError> {
        let message = build_video_message(video, thumbnail, metadata);
        let sent = self.client.send_video(self.chat_id, message).await?;

        self.monitor
            .register(sent.file_id, video)
            .await
            .map_err(|_| UploadError::MonitorClosed)?;

        info!(
            "Submitted {} as file {} ({} bytes)",
            video.display(),
            sent.file_id,
            sent.expected_size
        );
        Ok(sent.file_id)
    }
}
