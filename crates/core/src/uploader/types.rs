use thiserror::Error;

use crate::chat_client::ChatClientError;
use crate::cover::CoverError;
use crate::probe::ProbeError;

/// Per-file errors; none of them abort the batch.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cover preparation failed: {0}")]
    Cover(#[from] CoverError),

    #[error("media inspection failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("submission failed: {0}")]
    Submit(#[from] ChatClientError),

    #[error("progress monitor is no longer accepting uploads")]
    MonitorClosed,
}
