//! Testing utilities and mock implementations of the external services.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelpost_core::testing::{MockChatClient, MockCoverPreparer, MockInspector};
//!
//! let client = MockChatClient::authorized();
//! client.set_auto_complete(true);
//!
//! let inspector = MockInspector::new();
//! inspector.set_failure("/videos/broken.mkv", "moov atom not found").await;
//! ```

mod mock_chat_client;
mod mock_cover_preparer;
mod mock_inspector;

pub use mock_chat_client::{MockChatClient, RecordedSend, PROGRESS_BUFFER};
pub use mock_cover_preparer::MockCoverPreparer;
pub use mock_inspector::MockInspector;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::chat_client::{InputFile, InputThumbnail, VideoMessage};
    use crate::config::{Config, SourceConfig};
    use crate::cover::ThumbnailResult;
    use crate::probe::MediaMetadata;

    /// Create a thumbnail result without a file behind it.
    pub fn thumbnail(path: impl Into<PathBuf>, width: u32, height: u32) -> ThumbnailResult {
        ThumbnailResult {
            path: path.into(),
            width,
            height,
        }
    }

    pub fn metadata(duration_secs: f64, width: u32, height: u32) -> MediaMetadata {
        MediaMetadata {
            duration_secs,
            width,
            height,
        }
    }

    /// Create a minimal video message for a video path.
    pub fn video_message(video: impl Into<PathBuf>) -> VideoMessage {
        VideoMessage {
            video: InputFile::Local(video.into()),
            thumbnail: InputThumbnail {
                file: InputFile::local("thumb.jpg"),
                width: 320,
                height: 180,
            },
            duration: 60,
            width: 1280,
            height: 720,
            supports_streaming: true,
        }
    }

    /// Create empty files with the given names in `dir`.
    pub fn touch_all(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.join(name);
                std::fs::write(&path, b"fixture").expect("failed to write fixture file");
                path
            })
            .collect()
    }

    /// Create a valid config reading from `dir`.
    pub fn config(dir: &Path) -> Config {
        Config {
            api_id: "12345".to_string(),
            api_hash: "0123456789abcdef".to_string(),
            bot_token: "123456:TEST-TOKEN".to_string(),
            chat_id: -1001234567890,
            source: SourceConfig {
                dir: dir.to_path_buf(),
                ..SourceConfig::default()
            },
            cover: Default::default(),
            probe: Default::default(),
            client: Default::default(),
            monitor: Default::default(),
            orchestrator: Default::default(),
            logging: Default::default(),
        }
    }
}
