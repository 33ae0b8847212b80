//! Source directory scanning.
//!
//! Pairs every video in the source directory with a cover image whose file
//! name contains the video's base name.

mod matcher;
mod types;

pub use matcher::AssetMatcher;
pub use types::{AssetError, AssetPair};
