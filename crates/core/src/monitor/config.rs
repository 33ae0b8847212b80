//! Progress monitor configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the progress monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Minimum time between two progress reports for the same upload (milliseconds).
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,

    /// Capacity of the monitor's command channel.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

fn default_progress_interval() -> u64 {
    1000
}

fn default_command_buffer() -> usize {
    256
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: default_progress_interval(),
            command_buffer: default_command_buffer(),
        }
    }
}

impl MonitorConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}
