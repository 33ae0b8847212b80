//! Mock chat client for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::chat_client::{
    AuthorizationState, ChatClient, ChatClientError, ChatInfo, FileId, FileUpdate, FileUpdateHub,
    FileUpdateReceiver, SentVideo, VideoMessage,
};

/// Progress updates buffered per subscriber, matching the default client config.
pub const PROGRESS_BUFFER: usize = 256;

/// A recorded send_video call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub chat_id: i64,
    pub message: VideoMessage,
    /// The id handed back to the caller.
    pub file_id: FileId,
    pub timestamp: chrono::DateTime<Utc>,
}

/// Mock implementation of the ChatClient trait.
///
/// Provides controllable behavior for testing:
/// - Script authorization states and reject bot tokens
/// - Record sent videos for assertions
/// - Publish file updates on demand, or complete every upload automatically
/// - Simulate failures
///
/// # Example
///
/// ```rust,ignore
/// let client = MockChatClient::authorized();
/// let mut updates = client.subscribe_file_updates();
///
/// let sent = client.send_video(-100, message).await?;
/// client.emit(FileUpdate::completed(sent.file_id, "AgAD", 1024));
/// ```
#[derive(Debug)]
pub struct MockChatClient {
    /// States returned by successive authorization_state calls; the last one sticks.
    auth_script: Arc<RwLock<VecDeque<AuthorizationState>>>,
    state: Arc<RwLock<AuthorizationState>>,
    reject_token: AtomicBool,
    checked_tokens: Arc<RwLock<Vec<String>>>,
    missing_chats: Arc<RwLock<HashSet<i64>>>,
    sends: Arc<RwLock<Vec<RecordedSend>>>,
    failing_videos: Arc<RwLock<HashSet<PathBuf>>>,
    /// If set, the next send_video fails with this error.
    next_error: Arc<RwLock<Option<ChatClientError>>>,
    auto_complete: AtomicBool,
    next_file_id: AtomicI32,
    updates: FileUpdateHub,
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChatClient {
    /// Create a client that waits for a bot token.
    pub fn new() -> Self {
        Self {
            auth_script: Arc::new(RwLock::new(VecDeque::new())),
            state: Arc::new(RwLock::new(AuthorizationState::WaitBotToken)),
            reject_token: AtomicBool::new(false),
            checked_tokens: Arc::new(RwLock::new(Vec::new())),
            missing_chats: Arc::new(RwLock::new(HashSet::new())),
            sends: Arc::new(RwLock::new(Vec::new())),
            failing_videos: Arc::new(RwLock::new(HashSet::new())),
            next_error: Arc::new(RwLock::new(None)),
            auto_complete: AtomicBool::new(false),
            next_file_id: AtomicI32::new(1),
            updates: FileUpdateHub::new(PROGRESS_BUFFER),
        }
    }

    /// Create a client that is already authorized.
    pub fn authorized() -> Self {
        Self::with_state(AuthorizationState::Ready)
    }

    /// Create a client starting in the given authorization state.
    pub fn with_state(state: AuthorizationState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            ..Self::new()
        }
    }

    /// Queue states for the next authorization_state calls.
    pub async fn script_authorization(&self, states: impl IntoIterator<Item = AuthorizationState>) {
        self.auth_script.write().await.extend(states);
    }

    /// Make every bot token check fail.
    pub fn reject_bot_token(&self) {
        self.reject_token.store(true, Ordering::SeqCst);
    }

    /// Tokens passed to check_bot_token, in call order.
    pub async fn checked_tokens(&self) -> Vec<String> {
        self.checked_tokens.read().await.clone()
    }

    /// Make get_chat fail for this chat.
    pub async fn remove_chat(&self, chat_id: i64) {
        self.missing_chats.write().await.insert(chat_id);
    }

    /// Get all recorded send_video calls.
    pub async fn sent_videos(&self) -> Vec<RecordedSend> {
        self.sends.read().await.clone()
    }

    /// Set an error to be returned by the next send_video.
    pub async fn set_next_error(&self, error: ChatClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make send_video fail for this video path.
    pub async fn fail_video(&self, path: impl Into<PathBuf>) {
        self.failing_videos.write().await.insert(path.into());
    }

    /// Publish progress and completion for each upload as soon as it is sent.
    ///
    /// The updates go out before send_video returns, like a very fast server.
    pub fn set_auto_complete(&self, enabled: bool) {
        self.auto_complete.store(enabled, Ordering::SeqCst);
    }

    /// Publish a file update to subscribers. Returns the subscriber count.
    pub fn emit(&self, update: FileUpdate) -> usize {
        self.updates.publish(update)
    }

    pub fn subscriber_count(&self) -> usize {
        self.updates.subscriber_count()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn authorization_state(&self) -> AuthorizationState {
        if let Some(next) = self.auth_script.write().await.pop_front() {
            *self.state.write().await = next;
        }
        *self.state.read().await
    }

    async fn check_bot_token(&self, token: &str) -> Result<(), ChatClientError> {
        self.checked_tokens.write().await.push(token.to_string());

        if self.reject_token.load(Ordering::SeqCst) {
            return Err(ChatClientError::AuthenticationFailed(
                "Unauthorized".to_string(),
            ));
        }
        *self.state.write().await = AuthorizationState::Ready;
        Ok(())
    }

    async fn get_chat(&self, chat_id: i64) -> Result<ChatInfo, ChatClientError> {
        if *self.state.read().await != AuthorizationState::Ready {
            return Err(ChatClientError::NotAuthorized);
        }
        if self.missing_chats.read().await.contains(&chat_id) {
            return Err(ChatClientError::ChatNotFound(chat_id));
        }
        Ok(ChatInfo {
            id: chat_id,
            title: Some("Mock Chat".to_string()),
            kind: "channel".to_string(),
        })
    }

    async fn send_video(
        &self,
        chat_id: i64,
        message: VideoMessage,
    ) -> Result<SentVideo, ChatClientError> {
        if *self.state.read().await != AuthorizationState::Ready {
            return Err(ChatClientError::NotAuthorized);
        }
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if self
            .failing_videos
            .read()
            .await
            .contains(message.video.path())
        {
            return Err(ChatClientError::ApiError(format!(
                "Bad Request: cannot send {}",
                message.video.path().display()
            )));
        }

        let file_id = self.next_file_id.fetch_add(1, Ordering::SeqCst);
        let expected_size = std::fs::metadata(message.video.path())
            .map(|m| m.len())
            .unwrap_or(0);

        self.sends.write().await.push(RecordedSend {
            chat_id,
            message,
            file_id,
            timestamp: Utc::now(),
        });

        if self.auto_complete.load(Ordering::SeqCst) {
            self.emit(FileUpdate::uploading(file_id, expected_size / 2, expected_size));
            self.emit(FileUpdate::completed(
                file_id,
                format!("mock-unique-{}", file_id),
                expected_size,
            ));
        }

        Ok(SentVideo {
            file_id,
            expected_size,
        })
    }

    fn subscribe_file_updates(&self) -> FileUpdateReceiver {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_token_check_authorizes() {
        let client = MockChatClient::new();
        assert_eq!(
            client.authorization_state().await,
            AuthorizationState::WaitBotToken
        );
        client.check_bot_token("123:abc").await.unwrap();
        assert_eq!(client.authorization_state().await, AuthorizationState::Ready);
        assert_eq!(client.checked_tokens().await, vec!["123:abc".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_states_then_last_sticks() {
        let client = MockChatClient::authorized();
        client
            .script_authorization([AuthorizationState::WaitBotToken, AuthorizationState::Closed])
            .await;
        assert_eq!(
            client.authorization_state().await,
            AuthorizationState::WaitBotToken
        );
        assert_eq!(client.authorization_state().await, AuthorizationState::Closed);
        assert_eq!(client.authorization_state().await, AuthorizationState::Closed);
    }

    #[tokio::test]
    async fn test_send_requires_authorization() {
        let client = MockChatClient::new();
        let result = client.send_video(1, fixtures::video_message("a.mp4")).await;
        assert!(matches!(result, Err(ChatClientError::NotAuthorized)));
    }

    #[tokio::test]
    async fn test_auto_complete_publishes_updates() {
        let client = MockChatClient::authorized();
        client.set_auto_complete(true);
        let mut updates = client.subscribe_file_updates();

        let sent = client
            .send_video(1, fixtures::video_message("a.mp4"))
            .await
            .unwrap();

        let first = updates.recv().await.unwrap();
        let second = updates.recv().await.unwrap();
        assert_eq!(first.id, sent.file_id);
        assert!(second.remote.unwrap().is_uploading_completed);
    }

    #[tokio::test]
    async fn test_file_ids_are_unique() {
        let client = MockChatClient::authorized();
        let a = client.send_video(1, fixtures::video_message("a.mp4")).await.unwrap();
        let b = client.send_video(1, fixtures::video_message("b.mp4")).await.unwrap();
        assert_ne!(a.file_id, b.file_id);
    }
}
