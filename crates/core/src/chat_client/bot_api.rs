//! Telegram Bot API client implementation.

use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream};
use reqwest::{multipart, Body, Client};
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;

use super::{
    AppCredentials, AuthorizationState, ChatClient, ChatClientError, ChatInfo, FileId, FileUpdate,
    FileUpdateHub, FileUpdateReceiver, SentVideo, VideoMessage,
};

/// Multipart field carrying the thumbnail bytes.
const THUMBNAIL_FIELD: &str = "thumbnail_file";

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, ChatClientError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => {
                let description = self
                    .description
                    .unwrap_or_else(|| "no description".to_string());
                match self.error_code {
                    Some(401) => Err(ChatClientError::AuthenticationFailed(description)),
                    Some(code) => Err(ChatClientError::ApiError(format!(
                        "{} ({})",
                        description, code
                    ))),
                    None => Err(ChatClientError::ApiError(description)),
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: i64,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChat {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    title: Option<String>,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    file_unique_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message_id: i64,
    video: Option<ApiFile>,
    /// Videos the server refuses to treat as video come back as documents.
    document: Option<ApiFile>,
}

fn map_request_error(e: reqwest::Error) -> ChatClientError {
    if e.is_timeout() {
        ChatClientError::Timeout
    } else if e.is_connect() {
        ChatClientError::ConnectionFailed(e.to_string())
    } else {
        ChatClientError::ApiError(e.to_string())
    }
}

fn build_http(timeout: Option<Duration>) -> Result<Client, ChatClientError> {
    let mut builder = Client::builder().connect_timeout(Duration::from_secs(10));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    #[cfg(test)]
    {
        builder = builder.no_proxy();
    }
    builder
        .build()
        .map_err(|e| ChatClientError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Bot API client.
///
/// Uploads are streamed as multipart bodies from a background task. Every chunk
/// handed to the transport publishes an "uploading" [`FileUpdate`]; the final
/// response publishes either a "completed" or a failed update.
pub struct BotApiClient {
    http: Client,
    /// Separate client without a total timeout so large uploads are not cut off.
    upload_http: Client,
    config: ClientConfig,
    credentials: AppCredentials,
    /// Bot token, set once `getMe` accepted it.
    token: RwLock<Option<String>>,
    next_file_id: AtomicI32,
    updates: FileUpdateHub,
}

impl BotApiClient {
    /// Create a new Bot API client.
    pub fn new(config: ClientConfig, credentials: AppCredentials) -> Result<Self, ChatClientError> {
        let http = build_http(Some(Duration::from_secs(config.request_timeout_secs)))?;
        let upload_http = build_http(None)?;
        let updates = FileUpdateHub::new(config.event_buffer);

        Ok(Self {
            http,
            upload_http,
            config,
            credentials,
            token: RwLock::new(None),
            next_file_id: AtomicI32::new(1),
            updates,
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url(), token, method)
    }

    async fn require_token(&self) -> Result<String, ChatClientError> {
        self.token
            .read()
            .await
            .clone()
            .ok_or(ChatClientError::NotAuthorized)
    }
}

#[async_trait]
impl ChatClient for BotApiClient {
    fn name(&self) -> &str {
        "bot_api"
    }

    async fn authorization_state(&self) -> AuthorizationState {
        if !self.credentials.is_complete() {
            return AuthorizationState::Closed;
        }
        if self.token.read().await.is_some() {
            AuthorizationState::Ready
        } else {
            AuthorizationState::WaitBotToken
        }
    }

    async fn check_bot_token(&self, token: &str) -> Result<(), ChatClientError> {
        if !self.credentials.is_complete() {
            return Err(ChatClientError::AuthenticationFailed(
                "application credentials are missing".to_string(),
            ));
        }

        let url = self.method_url(token, "getMe");
        let response = self.http.get(&url).send().await.map_err(map_request_error)?;
        let body: ApiResponse<ApiUser> = response
            .json()
            .await
            .map_err(|e| ChatClientError::ApiError(e.to_string()))?;

        let user = body.into_result().map_err(|e| match e {
            ChatClientError::ApiError(msg) => ChatClientError::AuthenticationFailed(msg),
            other => other,
        })?;

        info!(
            "Bot token accepted for {} (app {})",
            user.username.as_deref().unwrap_or("<no username>"),
            self.credentials.api_id
        );
        debug!("Bot user id: {}", user.id);

        *self.token.write().await = Some(token.to_string());
        Ok(())
    }

    async fn get_chat(&self, chat_id: i64) -> Result<ChatInfo, ChatClientError> {
        let token = self.require_token().await?;
        let url = self.method_url(&token, "getChat");

        let response = self
            .http
            .get(&url)
            .query(&[("chat_id", chat_id.to_string())])
            .send()
            .await
            .map_err(map_request_error)?;
        let body: ApiResponse<ApiChat> = response
            .json()
            .await
            .map_err(|e| ChatClientError::ApiError(e.to_string()))?;

        if !body.ok && body.error_code == Some(400) {
            return Err(ChatClientError::ChatNotFound(chat_id));
        }

        let chat = body.into_result()?;
        Ok(ChatInfo {
            id: chat.id,
            title: chat.title.or(chat.username),
            kind: chat.kind,
        })
    }

    async fn send_video(
        &self,
        chat_id: i64,
        message: VideoMessage,
    ) -> Result<SentVideo, ChatClientError> {
        let token = self.require_token().await?;

        let video_path = message.video.path();
        let video_size = tokio::fs::metadata(video_path)
            .await
            .map_err(|e| {
                ChatClientError::InvalidRequest(format!(
                    "cannot read video {}: {}",
                    video_path.display(),
                    e
                ))
            })?
            .len();

        let thumbnail_path = message.thumbnail.file.path();
        let thumbnail = tokio::fs::read(thumbnail_path).await.map_err(|e| {
            ChatClientError::InvalidRequest(format!(
                "cannot read thumbnail {}: {}",
                thumbnail_path.display(),
                e
            ))
        })?;

        let thumbnail_name = file_name(thumbnail_path, "thumbnail.jpg");

        let file_id = self.next_file_id.fetch_add(1, Ordering::SeqCst);
        let job = UploadJob {
            url: self.method_url(&token, "sendVideo"),
            chat_id,
            message,
            video_size,
            thumbnail,
            thumbnail_name,
            file_id,
            chunk_size: self.config.upload_chunk_size.max(1),
        };

        let http = self.upload_http.clone();
        let updates = self.updates.clone();
        tokio::spawn(async move {
            let update = match job.run(&http, &updates).await {
                Ok(unique_id) => FileUpdate::completed(file_id, unique_id, video_size),
                Err(e) => {
                    warn!("Upload of file {} failed: {}", file_id, e);
                    FileUpdate::failed(file_id, e.to_string(), video_size)
                }
            };
            // No subscribers just means nobody is tracking this upload
            updates.publish(update);
        });

        debug!("Queued upload {} ({} bytes)", file_id, video_size);
        Ok(SentVideo {
            file_id,
            expected_size: video_size,
        })
    }

    fn subscribe_file_updates(&self) -> FileUpdateReceiver {
        self.updates.subscribe()
    }
}

/// One `sendVideo` request, run in the background.
struct UploadJob {
    url: String,
    chat_id: i64,
    message: VideoMessage,
    video_size: u64,
    thumbnail: Vec<u8>,
    /// File name of the generated thumbnail, so the extension matches its encoding.
    thumbnail_name: String,
    file_id: FileId,
    chunk_size: usize,
}

impl UploadJob {
    /// Uploads the video and returns the remote unique file identifier.
    async fn run(
        self,
        http: &Client,
        updates: &FileUpdateHub,
    ) -> Result<String, ChatClientError> {
        let UploadJob {
            url,
            chat_id,
            message,
            video_size,
            thumbnail,
            thumbnail_name,
            file_id,
            chunk_size,
        } = self;

        let video_path = message.video.path();
        let file = tokio::fs::File::open(video_path).await.map_err(|e| {
            ChatClientError::InvalidRequest(format!(
                "cannot open video {}: {}",
                video_path.display(),
                e
            ))
        })?;

        let body = Body::wrap_stream(progress_stream(
            file,
            file_id,
            video_size,
            chunk_size,
            updates.clone(),
        ));
        let video_part =
            multipart::Part::stream_with_length(body, video_size).file_name(file_name(video_path, "video"));
        let thumbnail_part = multipart::Part::bytes(thumbnail).file_name(thumbnail_name);

        let form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("duration", message.duration.to_string())
            .text("width", message.width.to_string())
            .text("height", message.height.to_string())
            .text("supports_streaming", message.supports_streaming.to_string())
            .text("thumbnail", format!("attach://{}", THUMBNAIL_FIELD))
            .part("video", video_part)
            .part(THUMBNAIL_FIELD, thumbnail_part);

        let response = http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(map_request_error)?;
        let body: ApiResponse<ApiMessage> = response
            .json()
            .await
            .map_err(|e| ChatClientError::ApiError(e.to_string()))?;
        let sent = body.into_result()?;

        debug!("Message {} carries upload {}", sent.message_id, file_id);
        sent.video
            .or(sent.document)
            .map(|f| f.file_unique_id)
            .ok_or_else(|| ChatClientError::ApiError("response carries no file".to_string()))
    }
}

fn file_name(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}

/// Reads `file` in chunks, publishing the running byte count as each chunk is yielded.
fn progress_stream(
    file: tokio::fs::File,
    file_id: FileId,
    total: u64,
    chunk_size: usize,
    updates: FileUpdateHub,
) -> impl Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + 'static {
    stream::try_unfold((file, 0u64), move |(mut file, uploaded)| {
        let updates = updates.clone();
        async move {
            let mut chunk = vec![0u8; chunk_size];
            let read = file.read(&mut chunk).await?;
            if read == 0 {
                return Ok(None);
            }
            chunk.truncate(read);
            let uploaded = uploaded + read as u64;
            updates.publish(FileUpdate::uploading(file_id, uploaded, total));
            Ok::<_, std::io::Error>(Some((chunk, (file, uploaded))))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat_client::{InputFile, InputThumbnail};
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    const TOKEN: &str = "42:TEST-TOKEN";

    const GET_ME_OK: &str = r#"{"ok":true,"result":{"id":42,"is_bot":true,"username":"reel_bot"}}"#;

    /// Reads one HTTP/1.1 request and returns its head and body.
    async fn read_request(socket: &mut TcpStream) -> (String, Vec<u8>) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 8192];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let lower = head.to_ascii_lowercase();
        let content_length = lower
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        let chunked = lower.contains("transfer-encoding: chunked");

        loop {
            let body = &buf[header_end..];
            let done = match content_length {
                Some(len) => body.len() >= len,
                None if chunked => body.ends_with(b"0\r\n\r\n"),
                None => true,
            };
            if done {
                return (head, body.to_vec());
            }
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body");
            buf.extend_from_slice(&chunk[..n]);
        }
    }

    /// Serves one canned JSON body per connection, in order.
    async fn serve(
        responses: Vec<&'static str>,
    ) -> (String, JoinHandle<Vec<(String, Vec<u8>)>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut seen = Vec::new();
            for body in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                seen.push(read_request(&mut socket).await);
                let reply = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
            seen
        });
        (format!("http://{}", addr), handle)
    }

    fn client_for(base_url: String) -> BotApiClient {
        let config = ClientConfig {
            base_url,
            upload_chunk_size: 16 * 1024,
            ..ClientConfig::default()
        };
        BotApiClient::new(config, AppCredentials::new("1234", "hash")).unwrap()
    }

    fn video_message(video: PathBuf, thumbnail: PathBuf) -> VideoMessage {
        VideoMessage {
            video: InputFile::Local(video),
            thumbnail: InputThumbnail {
                file: InputFile::Local(thumbnail),
                width: 320,
                height: 180,
            },
            duration: 61,
            width: 1920,
            height: 1080,
            supports_streaming: true,
        }
    }

    #[test]
    fn test_api_response_into_result() {
        let ok: ApiResponse<ApiUser> = serde_json::from_str(GET_ME_OK).unwrap();
        assert_eq!(ok.into_result().unwrap().id, 42);

        let unauthorized: ApiResponse<ApiUser> =
            serde_json::from_str(r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#)
                .unwrap();
        assert!(matches!(
            unauthorized.into_result(),
            Err(ChatClientError::AuthenticationFailed(_))
        ));

        let too_big: ApiResponse<ApiMessage> = serde_json::from_str(
            r#"{"ok":false,"error_code":413,"description":"Request Entity Too Large"}"#,
        )
        .unwrap();
        match too_big.into_result() {
            Err(ChatClientError::ApiError(msg)) => assert!(msg.contains("413")),
            other => panic!("unexpected {:?}", other.map(|m| m.message_id)),
        }
    }

    #[test]
    fn test_method_url_trims_trailing_slash() {
        let client = client_for("https://example.test/".to_string());
        assert_eq!(
            client.method_url("1:abc", "getMe"),
            "https://example.test/bot1:abc/getMe"
        );
    }

    #[tokio::test]
    async fn test_incomplete_credentials_close_the_session() {
        let client =
            BotApiClient::new(ClientConfig::default(), AppCredentials::new("", "hash")).unwrap();
        assert_eq!(client.authorization_state().await, AuthorizationState::Closed);
        assert!(matches!(
            client.check_bot_token(TOKEN).await,
            Err(ChatClientError::AuthenticationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_check_bot_token_makes_session_ready() {
        let (base_url, server) = serve(vec![GET_ME_OK]).await;
        let client = client_for(base_url);

        assert_eq!(
            client.authorization_state().await,
            AuthorizationState::WaitBotToken
        );
        client.check_bot_token(TOKEN).await.unwrap();
        assert_eq!(client.authorization_state().await, AuthorizationState::Ready);

        let requests = server.await.unwrap();
        assert!(requests[0].0.starts_with(&format!("GET /bot{}/getMe", TOKEN)));
    }

    #[tokio::test]
    async fn test_rejected_bot_token_keeps_waiting() {
        let (base_url, _server) =
            serve(vec![r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#]).await;
        let client = client_for(base_url);

        let result = client.check_bot_token("0:bad").await;
        assert!(matches!(result, Err(ChatClientError::AuthenticationFailed(_))));
        assert_eq!(
            client.authorization_state().await,
            AuthorizationState::WaitBotToken
        );
    }

    #[tokio::test]
    async fn test_requests_before_authorization_fail() {
        let client = client_for("http://127.0.0.1:9".to_string());
        assert!(matches!(
            client.get_chat(1).await,
            Err(ChatClientError::NotAuthorized)
        ));

        let temp = TempDir::new().unwrap();
        let msg = video_message(temp.path().join("v.mp4"), temp.path().join("t.png"));
        assert!(matches!(
            client.send_video(1, msg).await,
            Err(ChatClientError::NotAuthorized)
        ));
    }

    #[tokio::test]
    async fn test_get_chat() {
        let (base_url, server) = serve(vec![
            GET_ME_OK,
            r#"{"ok":true,"result":{"id":-1001,"type":"channel","title":"Uploads"}}"#,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        ])
        .await;
        let client = client_for(base_url);
        client.check_bot_token(TOKEN).await.unwrap();

        let chat = client.get_chat(-1001).await.unwrap();
        assert_eq!(chat.id, -1001);
        assert_eq!(chat.kind, "channel");
        assert_eq!(chat.title.as_deref(), Some("Uploads"));

        let missing = client.get_chat(5).await;
        assert!(matches!(missing, Err(ChatClientError::ChatNotFound(5))));

        let requests = server.await.unwrap();
        assert!(requests[1].0.contains("getChat?chat_id=-1001"));
    }

    #[tokio::test]
    async fn test_send_video_with_missing_file_is_rejected() {
        let (base_url, _server) = serve(vec![GET_ME_OK]).await;
        let client = client_for(base_url);
        client.check_bot_token(TOKEN).await.unwrap();

        let temp = TempDir::new().unwrap();
        let msg = video_message(temp.path().join("missing.mp4"), temp.path().join("t.png"));
        assert!(matches!(
            client.send_video(1, msg).await,
            Err(ChatClientError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_send_video_streams_progress_then_completes() {
        let (base_url, server) = serve(vec![
            GET_ME_OK,
            r#"{"ok":true,"result":{"message_id":10,"video":{"file_id":"BAAC","file_unique_id":"AgADuniq"}}}"#,
        ])
        .await;
        let client = client_for(base_url);
        client.check_bot_token(TOKEN).await.unwrap();

        let temp = TempDir::new().unwrap();
        let video = temp.path().join("clip.mp4");
        let thumb = temp.path().join("clip.resize.jpg");
        std::fs::write(&video, vec![7u8; 50_000]).unwrap();
        std::fs::write(&thumb, b"jpeg-bytes").unwrap();

        let mut updates = client.subscribe_file_updates();
        let sent = client
            .send_video(-1001, video_message(video, thumb))
            .await
            .unwrap();
        assert_eq!(sent.expected_size, 50_000);

        let mut progress = Vec::new();
        let completed = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let update = updates.recv().await.unwrap();
                assert_eq!(update.id, sent.file_id);
                let remote = update.remote.clone().expect("remote state");
                if remote.is_uploading_completed {
                    break update;
                }
                progress.push(remote.uploaded_size);
            }
        })
        .await
        .expect("upload did not complete");

        assert_eq!(completed.remote.unwrap().unique_id, "AgADuniq");
        // 50_000 bytes in 16 KiB chunks
        assert_eq!(progress.len(), 4);
        assert_eq!(progress.last().copied(), Some(50_000));
        assert!(progress.windows(2).all(|w| w[0] < w[1]));

        let requests = server.await.unwrap();
        let (head, body) = &requests[1];
        assert!(head.starts_with(&format!("POST /bot{}/sendVideo", TOKEN)));
        assert!(body.len() > 50_000);
        let form = String::from_utf8_lossy(body);
        assert!(form.contains(r#"name="thumbnail_file"; filename="clip.resize.jpg""#));
        assert!(form.contains("attach://thumbnail_file"));
        assert!(form.contains(r#"filename="clip.mp4""#));
    }

    #[tokio::test]
    async fn test_send_video_api_error_publishes_failure() {
        let (base_url, _server) = serve(vec![
            GET_ME_OK,
            r#"{"ok":false,"error_code":413,"description":"Request Entity Too Large"}"#,
        ])
        .await;
        let client = client_for(base_url);
        client.check_bot_token(TOKEN).await.unwrap();

        let temp = TempDir::new().unwrap();
        let video = temp.path().join("big.mkv");
        let thumb = temp.path().join("big.resize.jpg");
        std::fs::write(&video, vec![1u8; 1000]).unwrap();
        std::fs::write(&thumb, b"jpeg").unwrap();

        let mut updates = client.subscribe_file_updates();
        let sent = client
            .send_video(-1001, video_message(video, thumb))
            .await
            .unwrap();

        let failure = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let update = updates.recv().await.unwrap();
                if update.error.is_some() {
                    break update;
                }
            }
        })
        .await
        .expect("no failure published");

        assert_eq!(failure.id, sent.file_id);
        assert!(failure.error.unwrap().contains("413"));
    }
}
