//! Types for chat client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::updates::FileUpdateReceiver;

/// Client-assigned identifier of a local file being uploaded.
pub type FileId = i32;

/// Errors that can occur during chat client operations.
#[derive(Debug, Error)]
pub enum ChatClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Client is not authorized")]
    NotAuthorized,

    #[error("Chat not found: {0}")]
    ChatNotFound(i64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Authorization progress of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationState {
    /// Waiting for a bot credential to be checked.
    WaitBotToken,
    /// Authorized; requests may be sent.
    Ready,
    /// The session cannot be used.
    Closed,
}

impl AuthorizationState {
    /// Returns the string representation for log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationState::WaitBotToken => "wait_bot_token",
            AuthorizationState::Ready => "ready",
            AuthorizationState::Closed => "closed",
        }
    }
}

/// Application credentials required before a session can be authorized.
#[derive(Clone, Default)]
pub struct AppCredentials {
    pub api_id: String,
    pub api_hash: String,
}

impl AppCredentials {
    pub fn new(api_id: impl Into<String>, api_hash: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            api_hash: api_hash.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.api_id.trim().is_empty() && !self.api_hash.trim().is_empty()
    }
}

impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .finish()
    }
}

/// Result of a chat lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInfo {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Chat kind as reported by the server (private, group, channel, ...).
    pub kind: String,
}

/// A file reference in an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFile {
    /// A file on the local disk, uploaded by the client.
    Local(PathBuf),
}

impl InputFile {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        InputFile::Local(path.into())
    }

    /// Path on the local disk.
    pub fn path(&self) -> &Path {
        match self {
            InputFile::Local(path) => path,
        }
    }
}

/// Thumbnail attached to a video message.
///
/// `width` and `height` describe the generated file. [`BotApiClient`](super::BotApiClient)
/// ignores them because `sendVideo` has no fields for thumbnail dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputThumbnail {
    pub file: InputFile,
    pub width: i32,
    pub height: i32,
}

/// Outgoing video message.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMessage {
    pub video: InputFile,
    pub thumbnail: InputThumbnail,
    /// Whole seconds.
    pub duration: i32,
    pub width: i32,
    pub height: i32,
    pub supports_streaming: bool,
}

/// Acknowledgement of a submitted video message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentVideo {
    /// Identifier that file-update notifications will carry.
    pub file_id: FileId,
    /// Size of the video in bytes.
    pub expected_size: u64,
}

/// Server-side state of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Remote identifier that stays stable across sessions; empty until known.
    pub unique_id: String,
    pub is_uploading_active: bool,
    pub is_uploading_completed: bool,
    pub uploaded_size: u64,
}

/// Raw file-update notification as published by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdate {
    pub id: FileId,
    pub expected_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteFile>,
    /// Set when the transfer was abandoned by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileUpdate {
    /// An in-progress upload notification.
    pub fn uploading(id: FileId, uploaded_size: u64, expected_size: u64) -> Self {
        Self {
            id,
            expected_size,
            remote: Some(RemoteFile {
                unique_id: String::new(),
                is_uploading_active: true,
                is_uploading_completed: false,
                uploaded_size,
            }),
            error: None,
        }
    }

    /// A finished upload notification.
    pub fn completed(id: FileId, unique_id: impl Into<String>, size: u64) -> Self {
        Self {
            id,
            expected_size: size,
            remote: Some(RemoteFile {
                unique_id: unique_id.into(),
                is_uploading_active: false,
                is_uploading_completed: true,
                uploaded_size: size,
            }),
            error: None,
        }
    }

    /// An abandoned upload notification.
    pub fn failed(id: FileId, reason: impl Into<String>, expected_size: u64) -> Self {
        Self {
            id,
            expected_size,
            remote: None,
            error: Some(reason.into()),
        }
    }

    /// Whether this update ends the upload, by completion or failure.
    pub fn is_terminal(&self) -> bool {
        self.error.is_some()
            || self
                .remote
                .as_ref()
                .is_some_and(|remote| remote.is_uploading_completed)
    }
}

/// Trait for messaging client backends.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Current authorization state of the session.
    async fn authorization_state(&self) -> AuthorizationState;

    /// Authorize the session with a bot credential.
    async fn check_bot_token(&self, token: &str) -> Result<(), ChatClientError>;

    /// Look up a chat by numeric identifier.
    async fn get_chat(&self, chat_id: i64) -> Result<ChatInfo, ChatClientError>;

    /// Submit a video message.
    ///
    /// Returns once the request is accepted; the upload itself is reported
    /// through [`ChatClient::subscribe_file_updates`].
    async fn send_video(
        &self,
        chat_id: i64,
        message: VideoMessage,
    ) -> Result<SentVideo, ChatClientError>;

    /// Subscribe to file-update notifications published after this call.
    ///
    /// Progress updates may be skipped under load. Completion and failure
    /// updates are always delivered.
    fn subscribe_file_updates(&self) -> FileUpdateReceiver;
}
