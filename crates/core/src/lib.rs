pub mod assets;
pub mod chat_client;
pub mod config;
pub mod cover;
pub mod monitor;
pub mod orchestrator;
pub mod probe;
pub mod testing;
pub mod uploader;

pub use assets::{AssetError, AssetMatcher, AssetPair};
pub use chat_client::{
    AppCredentials, AuthorizationState, BotApiClient, ChatClient, ChatClientError, FileId,
    FileUpdate, VideoMessage,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use cover::{CoverError, CoverPreparer, ImageCoverPreparer, ThumbnailResult};
pub use monitor::{
    start_monitor, FileEvent, MonitorHandle, MonitorRuntime, ObservationCallback,
    UploadObservation,
};
pub use orchestrator::{BatchReport, OrchestratorError, UploadOrchestrator};
pub use probe::{FfprobeInspector, MediaInspector, MediaMetadata, ProbeError};
pub use uploader::{UploadError, UploadSubmitter};
