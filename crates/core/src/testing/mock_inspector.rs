//! Mock media inspector for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::probe::{MediaInspector, MediaMetadata, ProbeError};

#[derive(Debug, Clone)]
enum Scripted {
    Metadata(MediaMetadata),
    Fail(String),
    Hang(Duration),
}

/// Mock implementation of the MediaInspector trait.
///
/// Unscripted paths return the default metadata. A hanging probe is cut off
/// by the mock's own time budget, the way the ffprobe inspector does it.
#[derive(Debug)]
pub struct MockInspector {
    scripted: Arc<RwLock<HashMap<PathBuf, Scripted>>>,
    inspected: Arc<RwLock<Vec<PathBuf>>>,
    default_metadata: MediaMetadata,
    timeout: Duration,
}

impl Default for MockInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInspector {
    /// Create a new mock inspector with a 5 second budget.
    pub fn new() -> Self {
        Self {
            scripted: Arc::new(RwLock::new(HashMap::new())),
            inspected: Arc::new(RwLock::new(Vec::new())),
            default_metadata: MediaMetadata {
                duration_secs: 60.0,
                width: 1280,
                height: 720,
            },
            timeout: Duration::from_secs(5),
        }
    }

    /// Use a different time budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn set_metadata(&self, path: impl Into<PathBuf>, metadata: MediaMetadata) {
        self.scripted
            .write()
            .await
            .insert(path.into(), Scripted::Metadata(metadata));
    }

    pub async fn set_failure(&self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.scripted
            .write()
            .await
            .insert(path.into(), Scripted::Fail(reason.into()));
    }

    /// Make the probe for this path take `delay` before answering.
    pub async fn set_hang(&self, path: impl Into<PathBuf>, delay: Duration) {
        self.scripted
            .write()
            .await
            .insert(path.into(), Scripted::Hang(delay));
    }

    /// Paths inspected so far, in call order.
    pub async fn inspected(&self) -> Vec<PathBuf> {
        self.inspected.read().await.clone()
    }
}

#[async_trait]
impl MediaInspector for MockInspector {
    fn name(&self) -> &str {
        "mock"
    }

    async fn inspect(&self, path: &Path) -> Result<MediaMetadata, ProbeError> {
        self.inspected.write().await.push(path.to_path_buf());

        let scripted = self.scripted.read().await.get(path).cloned();
        match scripted {
            None => Ok(self.default_metadata),
            Some(Scripted::Metadata(metadata)) => Ok(metadata),
            Some(Scripted::Fail(reason)) => Err(ProbeError::failed(reason)),
            Some(Scripted::Hang(delay)) => {
                let default_metadata = self.default_metadata;
                tokio::time::timeout(self.timeout, async move {
                    tokio::time::sleep(delay).await;
                    default_metadata
                })
                .await
                .map_err(|_| ProbeError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        }
    }
}
