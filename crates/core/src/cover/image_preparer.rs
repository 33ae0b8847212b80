//! Cover preparer backed by the `image` crate.

use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::config::{CoverConfig, ThumbnailFormat};
use super::error::CoverError;
use super::traits::{CoverPreparer, ThumbnailResult};

/// Resizes covers with a Lanczos filter and saves them in the configured format.
pub struct ImageCoverPreparer {
    config: CoverConfig,
}

impl ImageCoverPreparer {
    /// Creates a new preparer with the given configuration.
    pub fn new(config: CoverConfig) -> Self {
        Self { config }
    }

    /// Creates a preparer with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CoverConfig::default())
    }
}

/// Path of the thumbnail generated for `cover`: `<dir>/<stem>.<suffix>.<ext>`.
pub fn thumbnail_path(cover: &Path, suffix: &str, format: ThumbnailFormat) -> PathBuf {
    let stem = cover
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    cover.with_file_name(format!("{}.{}.{}", stem, suffix, format.extension()))
}

/// Scales so the longer edge equals `target`; the other edge follows the aspect ratio.
fn scale_to_longer_edge(image: &DynamicImage, target: u32) -> DynamicImage {
    // resize() fits inside the box while keeping the aspect ratio, so a square
    // box pins the longer edge to `target`.
    image.resize(target, target, FilterType::Lanczos3)
}

fn resize_cover(
    source: &Path,
    output: &Path,
    target: u32,
    format: ThumbnailFormat,
) -> Result<ThumbnailResult, CoverError> {
    let decoded = image::open(source).map_err(|e| CoverError::Decode {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;

    let scaled = scale_to_longer_edge(&decoded, target);

    let saved = match format {
        // JPEG has no alpha channel
        ThumbnailFormat::Jpeg => DynamicImage::ImageRgb8(scaled.to_rgb8())
            .save_with_format(output, ImageFormat::Jpeg),
        ThumbnailFormat::Png => scaled.save_with_format(output, ImageFormat::Png),
    };
    saved.map_err(|e| CoverError::Write {
            path: output.to_path_buf(),
            reason: e.to_string(),
        })?;

    Ok(ThumbnailResult {
        path: output.to_path_buf(),
        width: scaled.width(),
        height: scaled.height(),
    })
}

#[async_trait]
impl CoverPreparer for ImageCoverPreparer {
    fn name(&self) -> &str {
        "image"
    }

    async fn prepare(&self, path: &Path) -> Result<ThumbnailResult, CoverError> {
        if !path.exists() {
            return Err(CoverError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let source = path.to_path_buf();
        let output = thumbnail_path(path, &self.config.suffix, self.config.format);
        let target = self.config.target_size;
        let format = self.config.format;

        let result =
            tokio::task::spawn_blocking(move || resize_cover(&source, &output, target, format))
            .await
            .map_err(|e| CoverError::Task(e.to_string()))??;

        debug!(
            "Prepared thumbnail {} ({}x{})",
            result.path.display(),
            result.width,
            result.height
        );

        Ok(result)
    }
}
