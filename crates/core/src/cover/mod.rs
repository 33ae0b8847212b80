//! Cover thumbnail preparation.
//!
//! Covers are decoded, scaled so the longer edge equals the configured target
//! size, and written next to the source as a new JPEG (or PNG) artifact.

mod config;
mod error;
mod image_preparer;
mod traits;

pub use config::{CoverConfig, ThumbnailFormat};
pub use error::CoverError;
pub use image_preparer::{thumbnail_path, ImageCoverPreparer};
pub use traits::{CoverPreparer, ThumbnailResult};
