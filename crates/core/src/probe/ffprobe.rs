//! FFprobe-based media inspector.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::config::ProbeConfig;
use super::error::ProbeError;
use super::traits::{MediaInspector, MediaMetadata};

/// Inspects videos by running `ffprobe` and parsing its JSON output.
pub struct FfprobeInspector {
    config: ProbeConfig,
}

impl FfprobeInspector {
    /// Creates a new inspector with the given configuration.
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Creates an inspector with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ProbeConfig::default())
    }

    /// Parses ffprobe JSON output into MediaMetadata.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaMetadata, ProbeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: Option<ProbeFormat>,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            duration: Option<String>,
        }

        let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| ProbeError::Parse {
            reason: format!("Failed to parse ffprobe output: {}", e),
        })?;

        let video_stream = probe
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| ProbeError::NoVideoStream {
                path: path.to_path_buf(),
            })?;

        // Container duration first, then the stream's own
        let duration_secs = probe
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .or(video_stream.duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(MediaMetadata {
            duration_secs,
            width: video_stream.width.unwrap_or(0),
            height: video_stream.height.unwrap_or(0),
        })
    }

    async fn run_ffprobe(&self, path: &Path) -> Result<String, ProbeError> {
        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ProbeError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    ProbeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::failed(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn inspect(&self, path: &Path) -> Result<MediaMetadata, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        // Dropping the future on timeout kills the child process
        let stdout = timeout(self.config.timeout(), self.run_ffprobe(path))
            .await
            .map_err(|_| ProbeError::Timeout {
                timeout_ms: self.config.timeout_ms,
            })??;

        let metadata = Self::parse_probe_output(path, &stdout)?;
        debug!(
            "Probed {}: {:.2}s {}x{}",
            path.display(),
            metadata.duration_secs,
            metadata.width,
            metadata.height
        );
        Ok(metadata)
    }
}
