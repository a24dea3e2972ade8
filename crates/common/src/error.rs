//! Error types shared by the taskboard suite

use thiserror::Error;

/// Result type alias using the shared suite error
pub type Result<T> = std::result::Result<T, Error>;

/// Shared error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("Settings file not found: {0}")]
    SettingsNotFound(String),

    #[error("Config key not found: [{section}] {key}")]
    ConfigKey { section: String, key: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl Error {
    pub fn config_key(section: &str, key: &str) -> Self {
        Error::ConfigKey {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}
