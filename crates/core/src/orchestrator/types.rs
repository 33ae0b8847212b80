//! Types for the upload orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::AssetError;
use crate::chat_client::ChatClientError;

/// Fatal errors; any of them ends the run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The bot credential was rejected.
    #[error("authorization failed: {0}")]
    Authorization(#[source] ChatClientError),

    /// The client session closed before it became ready.
    #[error("client session closed before authorization completed")]
    SessionClosed,

    /// The destination chat could not be resolved.
    #[error("chat lookup failed: {0}")]
    Chat(#[source] ChatClientError),

    /// The source directory could not be listed.
    #[error(transparent)]
    Scan(#[from] AssetError),

    /// The progress monitor stopped while uploads were still expected.
    #[error("progress monitor stopped unexpectedly")]
    MonitorStopped,

    /// The configured failure threshold was reached.
    #[error("aborting after {failed} failed file(s) (limit {limit})")]
    TooManyFailures { failed: usize, limit: usize },
}

/// Outcome counts of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Videos found in the source directory.
    pub discovered: usize,
    /// Uploads accepted by the client and tracked to the end.
    pub submitted: usize,
    /// Videos without a cover.
    pub skipped: usize,
    /// Videos whose preparation, inspection or submission failed.
    pub failed: usize,
}
