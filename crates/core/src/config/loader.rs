use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::collections::BTreeMap;
use std::path::Path;

use super::{types::Config, ConfigError};

/// Config file read when no explicit path is given. It may be absent.
pub const DEFAULT_CONFIG_PATH: &str = "reelpost.toml";

/// Prefix for nested overrides such as `REELPOST_SOURCE__DIR`.
const ENV_PREFIX: &str = "REELPOST_";

/// Credentials that must stay verbatim. `API_HASH=0123456789` keeps its leading zero.
const TEXT_ENV: [&str; 3] = ["API_ID", "API_HASH", "BOT_TOKEN"];

/// Unprefixed variable naming the destination chat.
const CHAT_ENV: &str = "CHAT_ID";

/// Collect the text credentials straight from the process environment.
///
/// Figment's env provider parses all-digit values as integers, which drops leading
/// zeros. The unprefixed name wins over the prefixed one.
fn text_credentials() -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for key in TEXT_ENV {
        let prefixed = format!("{ENV_PREFIX}{key}");
        let value = std::env::var(key).or_else(|_| std::env::var(&prefixed));
        if let Ok(value) = value {
            values.insert(key.to_ascii_lowercase(), value);
        }
    }
    values
}

/// Load configuration from an optional TOML file with environment variable overrides.
///
/// An explicit `path` must exist. Without one, `reelpost.toml` is used when present
/// and the configuration may come entirely from the environment.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::new();

    match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
            figment = figment.merge(Toml::file(path));
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                figment = figment.merge(Toml::file(default_path));
            }
        }
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(Env::raw().only(&[CHAT_ENV]))
        .merge(Serialized::globals(text_credentials()))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
