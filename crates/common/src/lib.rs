//! Taskboard Common Library
//!
//! Settings, logging, and report primitives shared by the REST client and the
//! browser-driven scenarios.

pub mod config;
pub mod error;
pub mod logging;
pub mod report;

// Re-export commonly used types
pub use config::{ApiSettings, Settings, SettingsSource, UiSettings};
pub use error::{Error, Result};
pub use logging::LogConfig;
pub use report::{Attachment, AttachmentKind, DirReporter, MemoryReporter, NullReporter, Reporter};

/// Suite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
