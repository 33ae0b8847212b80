//! Directory scanner that pairs videos with covers.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::SourceConfig;

use super::types::{AssetError, AssetPair};

/// A regular file found in the source directory.
#[derive(Debug, Clone)]
struct ListedFile {
    name: String,
    path: PathBuf,
}

/// Scans one directory (non-recursive) for video/cover pairs.
pub struct AssetMatcher {
    config: SourceConfig,
    /// Covers whose stem ends with this suffix are our own resized output.
    artifact_suffix: Option<String>,
}

impl AssetMatcher {
    /// Creates a matcher over the configured source directory.
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            artifact_suffix: None,
        }
    }

    /// Excludes previously generated thumbnails (`<stem>.<suffix>.<ext>`) from cover matching.
    pub fn with_artifact_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.artifact_suffix = Some(suffix.into());
        self
    }

    /// The directory this matcher scans.
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Lists the source directory and returns one pair per video, in listing order.
    ///
    /// Videos without a matching cover are returned with `cover_path: None`; the
    /// caller decides how to report them. When several covers match, the first one
    /// in listing order wins.
    pub async fn scan(&self) -> Result<Vec<AssetPair>, AssetError> {
        let files = self.list_regular_files().await?;

        let covers: Vec<&ListedFile> = files
            .iter()
            .filter(|f| has_extension(&f.path, &self.config.image_extensions))
            .filter(|f| !self.is_artifact(&f.path))
            .collect();

        let pairs: Vec<AssetPair> = files
            .iter()
            .filter(|f| has_extension(&f.path, &self.config.video_extensions))
            .map(|video| {
                let base = base_filename(&video.name);
                let cover = covers.iter().find(|c| c.name.contains(base));
                AssetPair {
                    video_path: video.path.clone(),
                    cover_path: cover.map(|c| c.path.clone()),
                }
            })
            .collect();

        debug!(
            "Scanned {}: {} files, {} videos, {} candidate covers",
            self.config.dir.display(),
            files.len(),
            pairs.len(),
            covers.len()
        );

        Ok(pairs)
    }

    async fn list_regular_files(&self) -> Result<Vec<ListedFile>, AssetError> {
        let dir = &self.config.dir;
        let read_dir_err = |source| AssetError::ReadDir {
            path: dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_err)?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    debug!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            if !file_type.is_file() {
                continue;
            }
            files.push(ListedFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
            });
        }

        Ok(files)
    }

    fn is_artifact(&self, path: &Path) -> bool {
        let Some(suffix) = &self.artifact_suffix else {
            return false;
        };
        path.file_stem()
            .map(|stem| stem.to_string_lossy().ends_with(&format!(".{}", suffix)))
            .unwrap_or(false)
    }
}

/// File name without its last extension ("a.b.mp4" -> "a.b").
fn base_filename(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    fn matcher_for(dir: &Path) -> AssetMatcher {
        AssetMatcher::new(SourceConfig {
            dir: dir.to_path_buf(),
            ..SourceConfig::default()
        })
    }

    fn find<'a>(pairs: &'a [AssetPair], video: &str) -> &'a AssetPair {
        pairs
            .iter()
            .find(|p| p.video_path.file_name().unwrap() == video)
            .unwrap_or_else(|| panic!("no pair for {video}"))
    }

    #[test]
    fn test_base_filename() {
        assert_eq!(base_filename("movie.mp4"), "movie");
        assert_eq!(base_filename("a.b.mkv"), "a.b");
        assert_eq!(base_filename("noext"), "noext");
        assert_eq!(base_filename(".hidden"), ".hidden");
    }

    #[test]
    fn test_has_extension_is_case_insensitive() {
        let exts = vec!["mp4".to_string(), ".mkv".to_string()];
        assert!(has_extension(Path::new("a.MP4"), &exts));
        assert!(has_extension(Path::new("a.mkv"), &exts));
        assert!(!has_extension(Path::new("a.avi"), &exts));
        assert!(!has_extension(Path::new("mp4"), &exts));
    }

    #[tokio::test]
    async fn test_scan_pairs_video_with_cover() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.mp4");
        touch(temp.path(), "a.jpg");
        touch(temp.path(), "b.mkv");
        touch(temp.path(), "notes.txt");

        let pairs = matcher_for(temp.path()).scan().await.unwrap();
        assert_eq!(pairs.len(), 2);

        let a = find(&pairs, "a.mp4");
        assert_eq!(a.cover_path.as_deref(), Some(temp.path().join("a.jpg").as_path()));

        let b = find(&pairs, "b.mkv");
        assert!(b.cover_path.is_none());
    }

    #[tokio::test]
    async fn test_scan_matches_cover_by_substring() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "Episode 01.mkv");
        touch(temp.path(), "cover - Episode 01 (poster).png");

        let pairs = matcher_for(temp.path()).scan().await.unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].cover_path.is_some());
    }

    #[tokio::test]
    async fn test_scan_ignores_directories_named_like_videos() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("folder.mp4")).unwrap();
        std::fs::create_dir(temp.path().join("folder.png")).unwrap();
        touch(temp.path(), "clip.mp4");

        let pairs = matcher_for(temp.path()).scan().await.unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].video_name(), "clip.mp4");
        assert!(pairs[0].cover_path.is_none());
    }

    #[tokio::test]
    async fn test_scan_skips_generated_thumbnails() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "a.mp4");
        touch(temp.path(), "a.resize.png");

        let plain = matcher_for(temp.path()).scan().await.unwrap();
        assert!(plain[0].cover_path.is_some());

        let pairs = matcher_for(temp.path())
            .with_artifact_suffix("resize")
            .scan()
            .await
            .unwrap();
        assert!(pairs[0].cover_path.is_none());
    }

    #[tokio::test]
    async fn test_scan_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        let result = matcher_for(&temp.path().join("missing")).scan().await;
        assert!(matches!(result, Err(AssetError::ReadDir { .. })));
    }

    #[tokio::test]
    async fn test_scan_empty_directory() {
        let temp = TempDir::new().unwrap();
        let pairs = matcher_for(temp.path()).scan().await.unwrap();
        assert!(pairs.is_empty());
    }
}
