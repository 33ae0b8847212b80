//! Mock cover preparer for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cover::{thumbnail_path, CoverError, CoverPreparer, ThumbnailFormat, ThumbnailResult};

/// Mock implementation of the CoverPreparer trait.
///
/// Reports a thumbnail path next to the cover without touching the disk.
#[derive(Debug)]
pub struct MockCoverPreparer {
    failing: Arc<RwLock<HashSet<PathBuf>>>,
    prepared: Arc<RwLock<Vec<PathBuf>>>,
    width: u32,
    height: u32,
}

impl Default for MockCoverPreparer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCoverPreparer {
    /// Create a preparer that reports 320x180 thumbnails.
    pub fn new() -> Self {
        Self {
            failing: Arc::new(RwLock::new(HashSet::new())),
            prepared: Arc::new(RwLock::new(Vec::new())),
            width: 320,
            height: 180,
        }
    }

    /// Make preparation fail for this cover as if it could not be decoded.
    pub async fn fail_cover(&self, path: impl Into<PathBuf>) {
        self.failing.write().await.insert(path.into());
    }

    /// Covers prepared so far, in call order.
    pub async fn prepared(&self) -> Vec<PathBuf> {
        self.prepared.read().await.clone()
    }
}

#[async_trait]
impl CoverPreparer for MockCoverPreparer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn prepare(&self, path: &Path) -> Result<ThumbnailResult, CoverError> {
        self.prepared.write().await.push(path.to_path_buf());

        if self.failing.read().await.contains(path) {
            return Err(CoverError::Decode {
                path: path.to_path_buf(),
                reason: "mock decode failure".to_string(),
            });
        }

        Ok(ThumbnailResult {
            path: thumbnail_path(path, "resize", ThumbnailFormat::Jpeg),
            width: self.width,
            height: self.height,
        })
    }
}
