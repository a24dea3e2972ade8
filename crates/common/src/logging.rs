//! Log-file setup
//!
//! Every run writes a timestamped log file under the log directory. The
//! `SystemLog` stream is also echoed to the console.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Logger name whose output is mirrored to the console
pub const SYSTEM_LOG: &str = "SystemLog";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Prefix of the log file name
    pub name: String,

    /// Directory that receives log files
    pub dir: PathBuf,

    /// Mirror output to stderr
    pub console: bool,

    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            name: SYSTEM_LOG.to_string(),
            dir: PathBuf::from("Log"),
            console: true,
            default_filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            console: name == SYSTEM_LOG,
            name,
            dir: dir.into(),
            ..Default::default()
        }
    }
}

/// Build the log file path for `name`, stamped to the minute
pub fn log_file_path(dir: &Path, name: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M");
    dir.join(format!("{}_{}.log", name, stamp))
}

/// Open (append) the log file, creating the directory if needed
pub fn open_log_file(config: &LogConfig) -> Result<(PathBuf, File)> {
    std::fs::create_dir_all(&config.dir)?;
    let path = log_file_path(&config.dir, &config.name);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((path, file))
}

/// Install the global subscriber and return the log file path
///
/// Fails if a global subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<PathBuf> {
    let (path, file) = open_log_file(config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true);

    let console_layer = config.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    tracing::info!("Logging to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_name_has_prefix_and_stamp() {
        let path = log_file_path(Path::new("Log"), "SystemLog");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("SystemLog_"));
        assert!(name.ends_with(".log"));
        // SystemLog_ + YYYYmmddHHMM + .log
        assert_eq!(name.len(), "SystemLog_".len() + 12 + ".log".len());
    }

    #[test]
    fn test_open_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let config = LogConfig::new("ApiLog", tmp.path().join("nested/Log"));
        assert!(!config.console);

        let (path, _file) = open_log_file(&config).unwrap();
        assert!(path.exists());
        assert!(path.starts_with(tmp.path()));
    }

    #[test]
    fn test_system_log_echoes_to_console() {
        assert!(LogConfig::new(SYSTEM_LOG, "Log").console);
    }
}
