//! Append-only status log
//!
//! One UTF-8 text file, one record per line, newline-terminated. The file
//! only ever grows; nothing here rewrites or compacts it. The ingest sinks
//! are the single writers, the pipeline only reads. Every reader takes its
//! own full snapshot, so overlapping scans never share mutable state.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;

/// Errors from status log file operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Log file could not be read. Surfaced to subscribers as an error
    /// payload instead of stale data.
    #[error("failed to read status log {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Append to the log file failed
    #[error("failed to append to status log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to the append-only status log file
///
/// Cheap to clone via `Arc`; all writers share the append-notification
/// channel so the publisher can react to new data without polling.
#[derive(Debug)]
pub struct StatusLog {
    path: PathBuf,
    appended: broadcast::Sender<()>,
}

impl StatusLog {
    /// Create a handle for the given log file path.
    /// The file itself is created lazily on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (appended, _) = broadcast::channel(64);
        Self {
            path: path.into(),
            appended,
        }
    }

    /// Path of the underlying log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Subscribe to append notifications
    ///
    /// A lagged receiver only means it missed some notifications; the next
    /// full rescan picks up everything anyway.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.appended.subscribe()
    }

    /// Append one record line (newline added here) and notify subscribers
    pub async fn append_line(&self, line: &str) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_err)?;

        file.write_all(format!("{}\n", line.trim_end_matches('\n')).as_bytes())
            .await
            .map_err(write_err)?;
        file.flush().await.map_err(write_err)?;

        tracing::debug!(path = %self.path.display(), line = %line, "appended record");

        // No receivers is fine; the publisher may not be running
        let _ = self.appended.send(());
        Ok(())
    }

    /// Read the entire current log contents as one snapshot
    pub async fn snapshot(&self) -> Result<String, StoreError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })
    }

    /// Current size of the log file in bytes, zero if it does not exist yet
    pub async fn len_bytes(&self) -> u64 {
        tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.len())
            .unwrap_or(0)
    }
}
