//! Video inspection via an external probe.
//!
//! The `MediaInspector` trait extracts the duration and frame size that the
//! upload request needs. `FfprobeInspector` runs `ffprobe` under a bounded
//! time budget.

mod config;
mod error;
mod ffprobe;
mod traits;

pub use config::ProbeConfig;
pub use error::ProbeError;
pub use ffprobe::FfprobeInspector;
pub use traits::{MediaInspector, MediaMetadata};
