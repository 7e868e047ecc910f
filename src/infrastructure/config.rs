//! Client configuration loading.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Coordinates, detect_locale};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:5000";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for one client session. Every field has a default, so an empty
/// JSON object is a valid configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the advisory service
    pub api_base: String,
    /// Locale tag override; the environment is consulted when unset
    pub locale: Option<String>,
    pub log_level: String,
    /// Log destination; logs are discarded when unset since the TUI owns the terminal
    pub log_file: Option<String>,
    /// Position reported as the device location
    pub device_location: Option<Coordinates>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            locale: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
            device_location: None,
        }
    }
}

impl ClientConfig {
    /// Resolves the locale tag once: explicit setting first, then the
    /// `LC_ALL`, `LC_MESSAGES` and `LANG` environment variables.
    pub fn resolve_locale(&self) -> String {
        let env = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .into_iter()
            .filter_map(|key| std::env::var(key).ok());
        detect_locale(self.locale.as_deref(), env)
    }
}

/// Load configuration from a JSON file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when the file cannot be read,
/// [`ConfigError::Parse`] for malformed JSON and [`ConfigError::Invalid`]
/// when [`validate_config`] rejects the values.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ClientConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from `path` when it exists, defaults otherwise.
pub fn load_config_or_default(path: &Path) -> Result<ClientConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(ClientConfig::default())
    }
}

/// Checks that `api_base` is an http(s) URL and that any configured device
/// position is a valid latitude/longitude pair.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] describing the first offending field.
pub fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
    let base = config.api_base.trim();
    if base.is_empty() {
        return Err(ConfigError::Invalid("api_base must not be empty".to_string()));
    }
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(ConfigError::Invalid(format!(
            "api_base must be an http(s) URL, got '{}'",
            base
        )));
    }

    if let Some(coords) = config.device_location {
        if !(-90.0..=90.0).contains(&coords.lat) {
            return Err(ConfigError::Invalid(format!(
                "device_location.lat must be within [-90, 90], got {}",
                coords.lat
            )));
        }
        if !(-180.0..=180.0).contains(&coords.lon) {
            return Err(ConfigError::Invalid(format!(
                "device_location.lon must be within [-180, 180], got {}",
                coords.lon
            )));
        }
    }

    Ok(())
}
