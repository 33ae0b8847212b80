//! Upload orchestrator implementation.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::assets::AssetMatcher;
use crate::chat_client::{AuthorizationState, ChatClient, FileId};
use crate::config::Config;
use crate::cover::CoverPreparer;
use crate::monitor::{start_monitor, MonitorConfig, MonitorRuntime, ObservationCallback};
use crate::probe::MediaInspector;
use crate::uploader::{UploadError, UploadSubmitter};

use super::config::OrchestratorConfig;
use super::types::{BatchReport, OrchestratorError};

/// Runs one upload batch against a single chat.
pub struct UploadOrchestrator {
    config: OrchestratorConfig,
    monitor_config: MonitorConfig,
    bot_token: String,
    chat_id: i64,
    matcher: AssetMatcher,
    client: Arc<dyn ChatClient>,
    covers: Arc<dyn CoverPreparer>,
    inspector: Arc<dyn MediaInspector>,
    on_observation: Option<ObservationCallback>,
}

impl UploadOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: &Config,
        client: Arc<dyn ChatClient>,
        covers: Arc<dyn CoverPreparer>,
        inspector: Arc<dyn MediaInspector>,
    ) -> Self {
        let matcher =
            AssetMatcher::new(config.source.clone()).with_artifact_suffix(&config.cover.suffix);

        Self {
            config: config.orchestrator.clone(),
            monitor_config: config.monitor.clone(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id,
            matcher,
            client,
            covers,
            inspector,
            on_observation: None,
        }
    }

    /// Receive every progress, completion and failure observation.
    pub fn with_observation_callback(mut self, callback: ObservationCallback) -> Self {
        self.on_observation = Some(callback);
        self
    }

    /// Run the batch to completion.
    ///
    /// Per-file errors are logged and counted; only setup failures, a stopped
    /// monitor or the failure threshold end the run early.
    pub async fn run(&self) -> Result<BatchReport, OrchestratorError> {
        self.authorize().await?;

        let chat = self
            .client
            .get_chat(self.chat_id)
            .await
            .map_err(OrchestratorError::Chat)?;
        info!(
            "Uploading to chat {} ({})",
            chat.id,
            chat.title.as_deref().unwrap_or(&chat.kind)
        );

        let mut monitor = start_monitor(
            self.client.clone(),
            &self.monitor_config,
            self.on_observation.clone(),
        );
        if monitor.wait_ready().await.is_err() {
            monitor.shutdown();
            return Err(OrchestratorError::MonitorStopped);
        }

        let result = self.run_batch(&mut monitor).await;
        monitor.shutdown();

        let report = result?;
        info!(
            "Done: {} discovered, {} submitted, {} skipped, {} failed",
            report.discovered, report.submitted, report.skipped, report.failed
        );
        Ok(report)
    }

    async fn authorize(&self) -> Result<(), OrchestratorError> {
        let interval = self.config.auth_poll_interval();

        loop {
            let state = self.client.authorization_state().await;
            debug!("Authorization state: {}", state.as_str());
            match state {
                AuthorizationState::WaitBotToken => {
                    info!("Authorizing with bot token");
                    self.client
                        .check_bot_token(&self.bot_token)
                        .await
                        .map_err(OrchestratorError::Authorization)?;
                }
                AuthorizationState::Ready => {
                    info!("Authorized via {}", self.client.name());
                    return Ok(());
                }
                AuthorizationState::Closed => return Err(OrchestratorError::SessionClosed),
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn run_batch(&self, monitor: &mut MonitorRuntime) -> Result<BatchReport, OrchestratorError> {
        let pairs = self.matcher.scan().await?;
        info!(
            "Found {} video(s) in {}",
            pairs.len(),
            self.matcher.dir().display()
        );

        let submitter =
            UploadSubmitter::new(self.client.clone(), self.chat_id, monitor.handle().clone());
        let mut report = BatchReport {
            discovered: pairs.len(),
            ..BatchReport::default()
        };

        for pair in &pairs {
            let Some(cover) = &pair.cover_path else {
                warn!("No cover found for {}, skipping", pair.video_name());
                report.skipped += 1;
                continue;
            };

            match self.process_pair(&submitter, &pair.video_path, cover).await {
                Ok(_) => report.submitted += 1,
                Err(UploadError::MonitorClosed) => return Err(OrchestratorError::MonitorStopped),
                Err(e) => {
                    error!("Skipping {}: {}", pair.video_path.display(), e);
                    report.failed += 1;

                    if let Some(limit) = self.config.max_failures {
                        if report.failed >= limit {
                            return Err(OrchestratorError::TooManyFailures {
                                failed: report.failed,
                                limit,
                            });
                        }
                    }
                }
            }
        }

        monitor
            .handle()
            .seal()
            .await
            .map_err(|_| OrchestratorError::MonitorStopped)?;

        if report.submitted == 0 {
            info!("No uploads in flight");
            return Ok(report);
        }

        info!("Waiting for {} upload(s) to finish", report.submitted);
        monitor
            .wait_drained()
            .await
            .map_err(|_| OrchestratorError::MonitorStopped)?;

        Ok(report)
    }

    async fn process_pair(
        &self,
        submitter: &UploadSubmitter,
        video: &Path,
        cover: &Path,
    ) -> Result<FileId, UploadError> {
        debug!("Processing {} with cover {}", video.display(), cover.display());

        let thumbnail = self.covers.prepare(cover).await?;
        let metadata = self.inspector.inspect(video).await?;
        submitter.submit(video, &thumbnail, &metadata).await
    }
}
