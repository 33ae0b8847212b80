//! Upload orchestrator.
//!
//! Drives one batch from start to finish:
//! - Authorization and chat lookup (fatal on failure)
//! - Discovery, then prepare, inspect and submit per pair, one at a time
//! - Waits for the progress monitor to drain the sealed batch

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::UploadOrchestrator;
pub use types::{BatchReport, OrchestratorError};
