//! Suite settings
//!
//! Settings live in a TOML file split into sections, one table per concern:
//!
//! ```toml
//! [api]
//! url = "https://api.trello.com/1"
//! key = "..."
//! token = "..."
//! board_name = "My_test_board"
//!
//! [ui]
//! login_url = "https://trello.com/login"
//! email = "someone@example.com"
//! password = "..."
//! workspace = "QA"
//! ```
//!
//! Callers only depend on [`SettingsSource::get`], so tests can hand in a
//! map-backed fake instead of a file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable that overrides the settings file location
pub const CONFIG_ENV: &str = "TASKBOARD_CONFIG";

/// Default settings file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/taskboard_env.toml";

/// Default REST root of the board service
pub const DEFAULT_API_URL: &str = "https://api.trello.com/1";

/// Default board name used by the creation scenarios
pub const DEFAULT_BOARD_NAME: &str = "My_test_board";

/// Lookup interface for named settings
pub trait SettingsSource {
    /// Fetch `key` from `section`, failing with [`Error::ConfigKey`] if absent
    fn get(&self, section: &str, key: &str) -> Result<String>;

    /// Fetch `key` from `section`, or `default` when absent
    fn get_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get(section, key).unwrap_or_else(|_| default.to_string())
    }
}

/// Sectioned key/value settings loaded from TOML
#[derive(Debug, Clone, Default)]
pub struct Settings {
    sections: BTreeMap<String, BTreeMap<String, String>>,
    source: Option<PathBuf>,
}

impl Settings {
    /// Resolve the settings path from `TASKBOARD_CONFIG` or the default
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::SettingsNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let mut settings = Self::from_toml_str(&content)?;
        settings.source = Some(path.to_path_buf());
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parse settings from a TOML string
    ///
    /// Top-level tables become sections. Scalar values are kept as their
    /// string form; nested tables and arrays are rejected.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = content.parse()?;
        let mut sections = BTreeMap::new();

        for (section, value) in table {
            let toml::Value::Table(entries) = value else {
                return Err(Error::InvalidConfig(format!(
                    "top-level key '{}' must be a section",
                    section
                )));
            };

            let mut values = BTreeMap::new();
            for (key, value) in entries {
                let text = match value {
                    toml::Value::String(s) => s,
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    toml::Value::Datetime(d) => d.to_string(),
                    toml::Value::Array(_) | toml::Value::Table(_) => {
                        return Err(Error::InvalidConfig(format!(
                            "[{}] {} must be a scalar value",
                            section, key
                        )));
                    }
                };
                values.insert(key, text);
            }
            sections.insert(section, values);
        }

        Ok(Self {
            sections,
            source: None,
        })
    }

    /// Insert or replace a single value
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// File the settings were loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl SettingsSource for Settings {
    fn get(&self, section: &str, key: &str) -> Result<String> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .cloned()
            .ok_or_else(|| Error::config_key(section, key))
    }
}

/// REST-side settings, the `[api]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    pub url: String,
    pub key: String,
    pub token: String,
    pub board_name: String,
}

impl ApiSettings {
    /// Read the `[api]` section; `key` and `token` are required
    pub fn from_source(source: &impl SettingsSource) -> Result<Self> {
        Ok(Self {
            url: source.get_or("api", "url", DEFAULT_API_URL),
            key: source.get("api", "key")?,
            token: source.get("api", "token")?,
            board_name: source.get_or("api", "board_name", DEFAULT_BOARD_NAME),
        })
    }
}

/// Browser-side settings, the `[ui]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    pub login_url: String,
    pub email: String,
    pub password: String,
    pub workspace: String,
}

impl UiSettings {
    pub fn from_source(source: &impl SettingsSource) -> Result<Self> {
        Ok(Self {
            login_url: source.get_or("ui", "login_url", "https://trello.com/login"),
            email: source.get("ui", "email")?,
            password: source.get("ui", "password")?,
            workspace: source.get("ui", "workspace")?,
        })
    }
}
