use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Credentials are present (api_id, api_hash, bot_token)
/// - chat_id is not 0
/// - Extension lists are not empty
/// - Cover size, probe timeout and progress interval are not 0
/// - Client base URL is set
/// - orchestrator.max_failures, when set, is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    for (name, value) in [
        ("api_id", &config.api_id),
        ("api_hash", &config.api_hash),
        ("bot_token", &config.bot_token),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                name
            )));
        }
    }

    if config.chat_id == 0 {
        return Err(ConfigError::ValidationError(
            "chat_id cannot be 0".to_string(),
        ));
    }

    if config.source.video_extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "source.video_extensions cannot be empty".to_string(),
        ));
    }

    if config.source.image_extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "source.image_extensions cannot be empty".to_string(),
        ));
    }

    if config.cover.target_size == 0 {
        return Err(ConfigError::ValidationError(
            "cover.target_size cannot be 0".to_string(),
        ));
    }

    if config.probe.timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "probe.timeout_ms cannot be 0".to_string(),
        ));
    }

    if config.monitor.progress_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "monitor.progress_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.client.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "client.base_url cannot be empty".to_string(),
        ));
    }

    if config.orchestrator.max_failures == Some(0) {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_failures must be at least 1 when set".to_string(),
        ));
    }

    Ok(())
}
