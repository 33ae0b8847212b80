//! Trait definitions for the probe module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ProbeError;

/// Duration and frame size of a video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaMetadata {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

/// Extracts upload metadata from a video file.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Returns the name of this inspector implementation.
    fn name(&self) -> &str;

    /// Probes the video at `path`.
    async fn inspect(&self, path: &Path) -> Result<MediaMetadata, ProbeError>;
}
