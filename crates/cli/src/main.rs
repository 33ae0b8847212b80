use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelpost_core::config::LoggingConfig;
use reelpost_core::{
    load_config, validate_config, AppCredentials, BotApiClient, ChatClient, CoverPreparer,
    FfprobeInspector, ImageCoverPreparer, MediaInspector, SanitizedConfig, UploadOrchestrator,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path; the default file is optional
    let config_path = std::env::var("REELPOST_CONFIG").ok().map(PathBuf::from);

    // Logging settings live in the config, so load it first
    let loaded = load_config(config_path.as_deref());
    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    init_logging(&logging);

    info!("Starting reelpost v{}", VERSION);
    let config = loaded.with_context(|| match &config_path {
        Some(path) => format!("Failed to load config from {:?}", path),
        None => "Failed to load config".to_string(),
    })?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    info!(
        "Configuration loaded: {}",
        serde_json::to_string(&sanitized).unwrap_or_default()
    );

    let client: Arc<dyn ChatClient> = Arc::new(
        BotApiClient::new(
            config.client.clone(),
            AppCredentials::new(&config.api_id, &config.api_hash),
        )
        .context("Failed to create chat client")?,
    );
    let covers: Arc<dyn CoverPreparer> = Arc::new(ImageCoverPreparer::new(config.cover.clone()));
    let inspector: Arc<dyn MediaInspector> =
        Arc::new(FfprobeInspector::new(config.probe.clone()));

    info!(
        "Using chat client: {}, cover preparer: {}, media inspector: {}",
        client.name(),
        covers.name(),
        inspector.name()
    );

    let orchestrator = UploadOrchestrator::new(&config, client, covers, inspector);
    let report = orchestrator.run().await.context("Upload batch failed")?;

    info!(
        "Batch report: {}",
        serde_json::to_string(&report).unwrap_or_default()
    );
    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
