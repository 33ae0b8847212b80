//! Upload submission.
//!
//! Turns a prepared (video, thumbnail, metadata) tuple into a video message,
//! submits it and registers the assigned file id with the progress monitor.

mod submitter;
mod types;

pub use submitter::{build_video_message, UploadSubmitter};
pub use types::UploadError;
