use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::chat_client::FileId;

use super::completion::{completion_signal, CompletionSignal, CompletionWaiter};
use super::config::MonitorConfig;
use super::handle::MonitorHandle;
use super::types::{
    FileEvent, MonitorCommand, ObservationCallback, ProgressTracker, UploadObservation,
};

/// How many uploads that finished before registration are remembered.
const EARLY_FINISH_CAPACITY: usize = 1024;

/// Terminal outcome seen for an id that was not registered yet.
#[derive(Debug, Clone)]
enum EarlyFinish {
    Completed { unique_id: String },
    Failed { reason: String },
}

/// Owner task of the tracker registry.
///
/// Every registry mutation happens inside [`ProgressMonitor::run`], driven by
/// the commands received on a single channel.
pub struct ProgressMonitor {
    rx: mpsc::Receiver<MonitorCommand>,
    registry: HashMap<FileId, ProgressTracker>,
    progress_interval: Duration,
    sealed: bool,
    early_finished: VecDeque<(FileId, EarlyFinish)>,
    completion: CompletionSignal,
    on_observation: Option<ObservationCallback>,
}

impl ProgressMonitor {
    fn new(
        rx: mpsc::Receiver<MonitorCommand>,
        config: &MonitorConfig,
        completion: CompletionSignal,
        on_observation: Option<ObservationCallback>,
    ) -> Self {
        Self {
            rx,
            registry: HashMap::new(),
            progress_interval: config.progress_interval(),
            sealed: false,
            early_finished: VecDeque::new(),
            completion,
            on_observation,
        }
    }

    /// Run the monitor, consuming commands until every handle is dropped.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        tracing::debug!("Progress monitor started");

        while let Some(command) = self.rx.recv().await {
            self.apply(command);
        }

        if !self.registry.is_empty() {
            tracing::warn!(
                "Progress monitor shutting down with {} upload(s) still tracked",
                self.registry.len()
            );
        }
        tracing::debug!("Progress monitor shutting down");
    }

    fn apply(&mut self, command: MonitorCommand) {
        match command {
            MonitorCommand::Register {
                file_id,
                video_path,
            } => self.register(file_id, video_path),
            MonitorCommand::Observed(event) => self.observe(event),
            MonitorCommand::Seal => {
                self.sealed = true;
                tracing::debug!("Batch sealed with {} upload(s) in flight", self.registry.len());
                self.check_drained();
            }
        }
    }

    fn register(&mut self, file_id: FileId, video_path: PathBuf) {
        let early = self
            .early_finished
            .iter()
            .position(|(id, _)| *id == file_id)
            .and_then(|pos| self.early_finished.remove(pos));
        if let Some((_, outcome)) = early {
            tracing::debug!("File {} finished before it was registered", file_id);
            self.finish(ProgressTracker::new(file_id, video_path), outcome);
            self.check_drained();
            return;
        }

        if self.registry.contains_key(&file_id) {
            tracing::warn!("File {} registered twice; keeping the newer path", file_id);
        }
        self.registry
            .insert(file_id, ProgressTracker::new(file_id, video_path));
    }

    fn observe(&mut self, event: FileEvent) {
        match event {
            FileEvent::Uploading {
                file_id,
                uploaded,
                expected,
            } => {
                let now = Instant::now();
                let interval = self.progress_interval;
                let Some(tracker) = self.registry.get_mut(&file_id) else {
                    return;
                };
                if !tracker.should_report(now, interval) {
                    return;
                }
                tracker.last_update = Some(now);

                tracing::info!(
                    "Uploading {}, {} / {}",
                    tracker.video_path.display(),
                    uploaded,
                    expected
                );
                let observation = UploadObservation::Progress {
                    file_id,
                    video_path: tracker.video_path.clone(),
                    uploaded,
                    expected,
                };
                self.notify(&observation);
            }
            FileEvent::Completed { file_id, unique_id } => {
                self.resolve(file_id, EarlyFinish::Completed { unique_id })
            }
            FileEvent::Failed { file_id, reason } => {
                self.resolve(file_id, EarlyFinish::Failed { reason })
            }
            FileEvent::Other => {}
        }
    }

    fn resolve(&mut self, file_id: FileId, outcome: EarlyFinish) {
        match self.registry.remove(&file_id) {
            Some(tracker) => {
                self.finish(tracker, outcome);
                self.check_drained();
            }
            None => self.remember_early_finish(file_id, outcome),
        }
    }

    fn finish(&self, tracker: ProgressTracker, outcome: EarlyFinish) {
        let observation = match outcome {
            EarlyFinish::Completed { unique_id } => {
                tracing::info!("Upload completed, unique id \"{}\"", unique_id);
                UploadObservation::Completed {
                    file_id: tracker.file_id,
                    video_path: tracker.video_path,
                    unique_id,
                }
            }
            EarlyFinish::Failed { reason } => {
                tracing::error!(
                    "Upload of {} failed: {}",
                    tracker.video_path.display(),
                    reason
                );
                UploadObservation::Failed {
                    file_id: tracker.file_id,
                    video_path: tracker.video_path,
                    reason,
                }
            }
        };
        self.notify(&observation);
    }

    fn remember_early_finish(&mut self, file_id: FileId, outcome: EarlyFinish) {
        if self.sealed {
            // Nothing can register after sealing
            return;
        }
        if self.early_finished.len() == EARLY_FINISH_CAPACITY {
            self.early_finished.pop_front();
        }
        self.early_finished.push_back((file_id, outcome));
    }

    fn check_drained(&mut self) {
        if self.sealed && self.registry.is_empty() && self.completion.fire() {
            tracing::info!("All tracked uploads finished");
        }
    }

    fn notify(&self, observation: &UploadObservation) {
        if let Some(callback) = &self.on_observation {
            callback(observation);
        }
    }
}

/// Create a progress monitor.
///
/// Returns:
/// - `MonitorHandle` - for registering uploads and forwarding events
/// - `ProgressMonitor` - spawn this with `tokio::spawn(monitor.run())`
/// - `CompletionWaiter` - resolves once the sealed batch has drained
pub fn create_progress_monitor(
    config: &MonitorConfig,
    on_observation: Option<ObservationCallback>,
) -> (MonitorHandle, ProgressMonitor, CompletionWaiter) {
    let (tx, rx) = mpsc::channel(config.command_buffer.max(1));
    let (signal, waiter) = completion_signal();
    let monitor = ProgressMonitor::new(rx, config, signal, on_observation);
    (MonitorHandle::new(tx), monitor, waiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_monitor() -> (ProgressMonitor, CompletionWaiter, Arc<Mutex<Vec<UploadObservation>>>)
    {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: ObservationCallback = Arc::new(move |obs: &UploadObservation| {
            sink.lock().unwrap().push(obs.clone());
        });
        let (_handle, monitor, waiter) =
            create_progress_monitor(&MonitorConfig::default(), Some(callback));
        (monitor, waiter, seen)
    }

    fn register(id: FileId, path: &str) -> MonitorCommand {
        MonitorCommand::Register {
            file_id: id,
            video_path: PathBuf::from(path),
        }
    }

    fn uploading(id: FileId, uploaded: u64) -> MonitorCommand {
        MonitorCommand::Observed(FileEvent::Uploading {
            file_id: id,
            uploaded,
            expected: 1000,
        })
    }

    fn completed(id: FileId) -> MonitorCommand {
        MonitorCommand::Observed(FileEvent::Completed {
            file_id: id,
            unique_id: format!("uniq-{id}"),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_throttled_per_upload() {
        let (mut monitor, _waiter, seen) = recording_monitor();
        monitor.apply(register(1, "a.mp4"));

        // First report is never suppressed, the burst after it is
        for uploaded in [100, 200, 300, 400] {
            monitor.apply(uploading(1, uploaded));
        }
        assert_eq!(seen.lock().unwrap().len(), 1);

        tokio::time::advance(Duration::from_millis(999)).await;
        monitor.apply(uploading(1, 500));
        assert_eq!(seen.lock().unwrap().len(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        monitor.apply(uploading(1, 600));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(
            seen[1],
            UploadObservation::Progress { uploaded: 600, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_is_independent_per_upload() {
        let (mut monitor, _waiter, seen) = recording_monitor();
        monitor.apply(register(1, "a.mp4"));
        monitor.apply(register(2, "b.mp4"));

        monitor.apply(uploading(1, 10));
        monitor.apply(uploading(2, 10));
        monitor.apply(uploading(1, 20));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], UploadObservation::Progress { file_id: 1, uploaded: 10, .. }));
        assert!(matches!(seen[1], UploadObservation::Progress { file_id: 2, uploaded: 10, .. }));
    }

    #[tokio::test]
    async fn test_events_for_unknown_ids_change_nothing() {
        let (mut monitor, _waiter, seen) = recording_monitor();
        monitor.apply(register(1, "a.mp4"));

        monitor.apply(uploading(42, 10));
        monitor.apply(MonitorCommand::Observed(FileEvent::Other));

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(monitor.registry.len(), 1);
        assert!(monitor.registry[&1].last_update.is_none());
    }

    #[tokio::test]
    async fn test_completion_removes_tracker_and_fires_after_seal() {
        let (mut monitor, waiter, seen) = recording_monitor();
        monitor.apply(register(1, "a.mp4"));
        monitor.apply(register(2, "b.mp4"));
        monitor.apply(MonitorCommand::Seal);
        assert!(!monitor.completion.has_fired());

        monitor.apply(completed(1));
        assert!(!monitor.completion.has_fired());
        monitor.apply(completed(2));
        assert!(monitor.completion.has_fired());
        assert!(monitor.registry.is_empty());

        waiter.wait().await.unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(
            &seen[1],
            UploadObservation::Completed { unique_id, .. } if unique_id == "uniq-2"
        ));
    }

    #[tokio::test]
    async fn test_drain_before_seal_waits_for_seal() {
        let (mut monitor, _waiter, _seen) = recording_monitor();
        monitor.apply(register(1, "a.mp4"));
        monitor.apply(completed(1));
        // More uploads may still be registered
        assert!(!monitor.completion.has_fired());

        monitor.apply(MonitorCommand::Seal);
        assert!(monitor.completion.has_fired());
    }

    #[tokio::test]
    async fn test_seal_on_empty_registry_fires_immediately() {
        let (mut monitor, waiter, _seen) = recording_monitor();
        monitor.apply(MonitorCommand::Seal);
        assert!(monitor.completion.has_fired());
        waiter.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_upload_is_terminal() {
        let (mut monitor, _waiter, seen) = recording_monitor();
        monitor.apply(register(1, "a.mp4"));
        monitor.apply(MonitorCommand::Seal);
        monitor.apply(MonitorCommand::Observed(FileEvent::Failed {
            file_id: 1,
            reason: "HTTP 413".to_string(),
        }));

        assert!(monitor.completion.has_fired());
        assert!(matches!(
            seen.lock().unwrap()[0],
            UploadObservation::Failed { file_id: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_completion_before_registration_resolves_on_register() {
        let (mut monitor, _waiter, seen) = recording_monitor();
        monitor.apply(completed(7));
        assert!(monitor.registry.is_empty());

        monitor.apply(register(7, "fast.mp4"));
        assert!(monitor.registry.is_empty());
        assert!(matches!(
            &seen.lock().unwrap()[..],
            [UploadObservation::Completed { file_id: 7, video_path, .. }]
                if video_path == &PathBuf::from("fast.mp4")
        ));

        monitor.apply(MonitorCommand::Seal);
        assert!(monitor.completion.has_fired());
    }

    #[tokio::test]
    async fn test_early_finish_memory_is_bounded() {
        let (mut monitor, _waiter, _seen) = recording_monitor();
        for id in 0..(EARLY_FINISH_CAPACITY as FileId + 10) {
            monitor.apply(completed(id));
        }
        assert_eq!(monitor.early_finished.len(), EARLY_FINISH_CAPACITY);

        // The oldest ids were evicted, so they register normally
        monitor.apply(register(0, "old.mp4"));
        assert!(monitor.registry.contains_key(&0));
    }

    #[tokio::test]
    async fn test_run_processes_commands_from_handle() {
        let (handle, monitor, waiter) =
            create_progress_monitor(&MonitorConfig::default(), None);
        let task = tokio::spawn(monitor.run());

        handle.register(1, "a.mp4").await.unwrap();
        handle
            .observe(FileEvent::Completed {
                file_id: 1,
                unique_id: "u".to_string(),
            })
            .await
            .unwrap();
        handle.seal().await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), waiter.wait())
            .await
            .expect("completion never fired")
            .unwrap();

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_waiter_errors_when_monitor_stops_undrained() {
        let (handle, monitor, waiter) =
            create_progress_monitor(&MonitorConfig::default(), None);
        let task = tokio::spawn(monitor.run());

        handle.register(1, "a.mp4").await.unwrap();
        drop(handle);
        task.await.unwrap();

        assert!(waiter.wait().await.is_err());
    }
}
