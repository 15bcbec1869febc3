//! Append-only diagnostic log
//!
//! One text line per fetched page, per fetched person and per failure. The log
//! is purely observational; nothing reads it back.

use crate::HarvestError;
use serde_json::Value;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Shared handle to the diagnostic log file
///
/// Lines from concurrent workers are serialized by an async mutex, so each
/// line lands whole.
#[derive(Debug)]
pub struct DiagnosticLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl DiagnosticLog {
    /// Opens (or creates) the log at `path` in append mode
    pub async fn open(path: &Path) -> Result<Self, HarvestError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|source| HarvestError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Records a decoded submissions page
    pub async fn page_fetched(&self, page: &Value) {
        self.append(&format!("Fetched page data: {}", page)).await;
    }

    /// Records a decoded person payload
    pub async fn person_fetched(&self, person: &Value) {
        self.append(&format!("Fetched person details: {}", person))
            .await;
    }

    /// Records a page that could not be fetched or decoded
    pub async fn page_failed(&self, url: &str, error: &impl Display) {
        self.append(&format!("Error fetching page: {} - {}", url, error))
            .await;
    }

    /// Records a person whose details could not be fetched or decoded
    pub async fn person_failed(&self, url: &str, error: &impl Display) {
        self.append(&format!(
            "Error fetching person details for: {} - {}",
            url, error
        ))
        .await;
    }

    /// Appends one line
    ///
    /// A failed write is reported through tracing and otherwise ignored.
    pub async fn append(&self, line: &str) {
        let mut file = self.file.lock().await;
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let result = match file.write_all(buf.as_bytes()).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!("Failed to append to {}: {}", self.path.display(), e);
        }
    }
}
