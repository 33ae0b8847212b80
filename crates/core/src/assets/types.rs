//! Types for asset discovery.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scanning the source directory.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The source directory could not be listed.
    #[error("Failed to read source directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A discovered video and its matched cover, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPair {
    pub video_path: PathBuf,
    pub cover_path: Option<PathBuf>,
}

impl AssetPair {
    /// Video file name for log lines.
    pub fn video_name(&self) -> String {
        self.video_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.video_path.display().to_string())
    }
}
