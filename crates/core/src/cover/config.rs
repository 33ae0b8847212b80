//! Configuration for cover preparation.

use serde::{Deserialize, Serialize};

/// Configuration for the cover preparer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverConfig {
    /// Length in pixels of the thumbnail's longer edge.
    #[serde(default = "default_target_size")]
    pub target_size: u32,

    /// Suffix inserted before the extension of the generated file.
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Encoding of the generated file. The Bot API only accepts JPEG thumbnails.
    #[serde(default)]
    pub format: ThumbnailFormat,
}

/// Image encoding of a generated thumbnail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailFormat {
    #[default]
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
}

impl ThumbnailFormat {
    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ThumbnailFormat::Jpeg => "jpg",
            ThumbnailFormat::Png => "png",
        }
    }
}

fn default_target_size() -> u32 {
    320
}

fn default_suffix() -> String {
    "resize".to_string()
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            suffix: default_suffix(),
            format: ThumbnailFormat::default(),
        }
    }
}
