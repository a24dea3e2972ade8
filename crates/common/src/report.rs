//! Report attachments
//!
//! Named text/JSON blobs attached to a test report alongside the log. The
//! sink is fire-and-forget: implementations log their own failures and never
//! hand them back to the caller.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Content type of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Text,
    Json,
}

impl AttachmentKind {
    fn extension(&self) -> &'static str {
        match self {
            AttachmentKind::Text => "txt",
            AttachmentKind::Json => "json",
        }
    }
}

/// A named attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub kind: AttachmentKind,
    pub body: String,
}

/// Sink for report attachments
pub trait Reporter: Send + Sync {
    fn attach(&self, name: &str, kind: AttachmentKind, body: &str);
}

/// Discards every attachment
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn attach(&self, _name: &str, _kind: AttachmentKind, _body: &str) {}
}

/// Keeps attachments in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemoryReporter {
    attachments: Mutex<Vec<Attachment>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything attached so far
    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments.lock().clone()
    }

    /// First attachment with the given name
    pub fn find(&self, name: &str) -> Option<Attachment> {
        self.attachments.lock().iter().find(|a| a.name == name).cloned()
    }

    pub fn clear(&self) {
        self.attachments.lock().clear();
    }
}

impl Reporter for MemoryReporter {
    fn attach(&self, name: &str, kind: AttachmentKind, body: &str) {
        self.attachments.lock().push(Attachment {
            name: name.to_string(),
            kind,
            body: body.to_string(),
        });
    }
}

/// Writes each attachment to its own file in a directory
///
/// Files are numbered in arrival order: `0001-requests_curl.txt`.
#[derive(Debug)]
pub struct DirReporter {
    dir: PathBuf,
    counter: AtomicUsize,
}

impl DirReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: AtomicUsize::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(&self, index: usize, name: &str, kind: AttachmentKind) -> String {
        let stem: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .take(80)
            .collect();
        format!("{:04}-{}.{}", index, stem, kind.extension())
    }
}

impl Reporter for DirReporter {
    fn attach(&self, name: &str, kind: AttachmentKind, body: &str) {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.dir.join(self.file_name(index, name, kind));

        let written = std::fs::create_dir_all(&self.dir).and_then(|_| std::fs::write(&path, body));
        if let Err(e) = written {
            warn!("Failed to write attachment '{}' to {}: {}", name, path.display(), e);
        }
    }
}
