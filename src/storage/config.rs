//! Engine configuration.
//!
//! Holds the split unit preference and the database location. Stored as a
//! TOML file in the platform data directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::splits::SplitUnit;

/// Engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Split unit preference (metric: 1 km, imperial: 1 mile)
    pub split_unit: SplitUnit,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            split_unit: SplitUnit::Metric,
            data_dir: PathBuf::new(),
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "runmetrics", "RunMetrics")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Get the database file path.
pub fn get_database_path() -> PathBuf {
    get_data_dir().join("runmetrics.db")
}

/// Load settings from file, falling back to defaults when absent.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let path = get_config_path();

    if !path.exists() {
        let settings = Settings {
            data_dir: get_data_dir(),
            ..Default::default()
        };
        return Ok(settings);
    }

    let content =
        std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut settings: Settings =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    settings.data_dir = get_data_dir();

    Ok(settings)
}

/// Save settings to file.
pub fn save_settings(settings: &Settings) -> Result<(), ConfigError> {
    let path = get_config_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(settings).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
