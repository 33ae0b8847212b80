//! Error types for the probe module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while inspecting a video.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// The probe did not finish within its budget.
    #[error("Probe timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// FFprobe exited unsuccessfully.
    #[error("Failed to probe media file: {reason}")]
    Failed { reason: String },

    /// FFprobe output could not be parsed.
    #[error("Failed to parse media info: {reason}")]
    Parse { reason: String },

    /// The container has no video stream.
    #[error("No video stream in {path}")]
    NoVideoStream { path: PathBuf },

    /// I/O error while running the probe.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Creates a new probe failed error.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}
