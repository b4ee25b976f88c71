//! Session history
//!
//! Successful inputs are appended to a store once their unit has committed.
//! The file store keeps one JSON string per line so multi-line inputs
//! survive a round trip.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

/// History errors
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode history entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistence boundary for successful inputs
pub trait HistoryStore: Send {
    /// Append one entry
    fn record(
        &mut self,
        entry: &str,
    ) -> Result<(), HistoryError>;

    /// All stored entries, oldest first
    fn load(&self) -> Result<Vec<String>, HistoryError>;
}

/// JSON-lines history file
///
/// Loading keeps the newest `max_entries` entries and rewrites the file when
/// it held more, so the file stays bounded across sessions.
#[derive(Debug, Clone)]
pub struct FileHistory {
    path: PathBuf,
    /// Entries kept when loading
    max_entries: usize,
}

impl FileHistory {
    /// Create a store backed by `path`; the file is created on first write
    pub fn new(
        path: impl Into<PathBuf>,
        max_entries: usize,
    ) -> Self {
        Self {
            path: path.into(),
            max_entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file with `entries`
    fn rewrite(
        &self,
        entries: &[String],
    ) -> Result<(), HistoryError> {
        let mut content = String::new();
        for entry in entries {
            content.push_str(&serde_json::to_string(entry)?);
            content.push('\n');
        }

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        fs::write(&staging, content).map_err(|e| self.io_error(e))?;
        fs::rename(&staging, &self.path).map_err(|e| self.io_error(e))
    }

    fn io_error(
        &self,
        source: std::io::Error,
    ) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl HistoryStore for FileHistory {
    fn record(
        &mut self,
        entry: &str,
    ) -> Result<(), HistoryError> {
        let line = serde_json::to_string(entry)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{}", line).map_err(|e| self.io_error(e))?;
        debug!("recorded history entry in {}", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<Vec<String>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;

        let mut entries = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<String>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(
                    "skipping malformed history line {} in {}: {}",
                    number + 1,
                    self.path.display(),
                    e
                ),
            }
        }

        if entries.len() > self.max_entries {
            let dropped = entries.len() - self.max_entries;
            entries.drain(..dropped);
            match self.rewrite(&entries) {
                Ok(()) => debug!("dropped {} old entries from {}", dropped, self.path.display()),
                Err(e) => warn!("failed to compact history: {}", e),
            }
        }
        Ok(entries)
    }
}

/// In-memory history; clones share their entries
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    entries: Arc<Mutex<Vec<String>>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded entries
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

impl HistoryStore for MemoryHistory {
    fn record(
        &mut self,
        entry: &str,
    ) -> Result<(), HistoryError> {
        self.entries.lock().push(entry.to_string());
        Ok(())
    }

    fn load(&self) -> Result<Vec<String>, HistoryError> {
        Ok(self.entries())
    }
}
