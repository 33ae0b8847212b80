//! Error types for the cover module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing a cover thumbnail.
#[derive(Debug, Error)]
pub enum CoverError {
    /// The cover file does not exist.
    #[error("Cover not found: {path}")]
    NotFound { path: PathBuf },

    /// The cover could not be decoded as an image.
    #[error("Failed to decode cover {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// The resized thumbnail could not be written.
    #[error("Failed to write thumbnail {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    /// The blocking resize task panicked or was cancelled.
    #[error("Resize task failed: {0}")]
    Task(String),
}
