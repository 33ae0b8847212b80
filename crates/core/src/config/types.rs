use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::cover::CoverConfig;
use crate::monitor::MonitorConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::probe::ProbeConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Application identifier issued for the messaging API.
    #[serde(deserialize_with = "string_or_number")]
    pub api_id: String,
    /// Application secret paired with `api_id`.
    #[serde(deserialize_with = "string_or_number")]
    pub api_hash: String,
    /// Bot credential used to authorize the session.
    #[serde(deserialize_with = "string_or_number")]
    pub bot_token: String,
    /// Destination chat for every upload.
    pub chat_id: i64,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub cover: CoverConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Environment values such as `API_ID=12345` arrive as numbers, so credentials
/// accept either form and are kept as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Signed(n) => n.to_string(),
        Raw::Unsigned(n) => n.to_string(),
    })
}

/// Where videos and covers are discovered
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_dir")]
    pub dir: PathBuf,
    /// Extensions (without the dot) treated as videos.
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
    /// Extensions (without the dot) treated as cover images.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: default_source_dir(),
            video_extensions: default_video_extensions(),
            image_extensions: default_image_extensions(),
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("./tmp")
}

fn default_video_extensions() -> Vec<String> {
    vec!["mkv".to_string(), "mp4".to_string()]
}

fn default_image_extensions() -> Vec<String> {
    vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()]
}

/// Messaging API client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// API root (e.g., "https://api.telegram.org" or a self-hosted Bot API server)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for non-upload requests in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Bytes read from disk per upload chunk; each chunk yields one progress event.
    #[serde(default = "default_chunk_size")]
    pub upload_chunk_size: usize,
    /// Progress updates buffered per subscriber. Completion and failure updates are not bounded.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            upload_chunk_size: default_chunk_size(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    64 * 1024
}

fn default_event_buffer() -> usize {
    256
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Sanitized config for startup logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub api_id: String,
    pub api_hash_configured: bool,
    pub bot_token_configured: bool,
    pub chat_id: i64,
    pub source: SourceConfig,
    pub cover: CoverConfig,
    pub probe: ProbeConfig,
    pub client: ClientConfig,
    pub monitor: MonitorConfig,
    pub orchestrator: OrchestratorConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            api_id: config.api_id.clone(),
            api_hash_configured: !config.api_hash.trim().is_empty(),
            bot_token_configured: !config.bot_token.trim().is_empty(),
            chat_id: config.chat_id,
            source: config.source.clone(),
            cover: config.cover.clone(),
            probe: config.probe.clone(),
            client: config.client.clone(),
            monitor: config.monitor.clone(),
            orchestrator: config.orchestrator.clone(),
        }
    }
}
