//! Trait definitions for the cover module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::CoverError;

/// A resized cover written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailResult {
    /// Path of the new artifact (never the source cover).
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Turns a cover image into an upload thumbnail.
#[async_trait]
pub trait CoverPreparer: Send + Sync {
    /// Returns the name of this preparer implementation.
    fn name(&self) -> &str;

    /// Produces a thumbnail for the cover at `path`.
    async fn prepare(&self, path: &Path) -> Result<ThumbnailResult, CoverError>;
}
