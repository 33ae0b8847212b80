//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the upload orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// How often to poll the client's authorization state (milliseconds).
    #[serde(default = "default_auth_poll_interval")]
    pub auth_poll_interval_ms: u64,

    /// Abort the batch once this many files have failed (unset = never).
    /// Files skipped for lack of a cover do not count.
    #[serde(default)]
    pub max_failures: Option<usize>,
}

fn default_auth_poll_interval() -> u64 {
    500
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            auth_poll_interval_ms: default_auth_poll_interval(),
            max_failures: None,
        }
    }
}

impl OrchestratorConfig {
    pub fn auth_poll_interval(&self) -> Duration {
        Duration::from_millis(self.auth_poll_interval_ms)
    }
}
