//! Terminal export: time-filtered snapshot of the store

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::message::{StoredMessage, strip_sigil};
use crate::store::{MessageStore, StoreError};

/// Errors produced while exporting
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No messages matched the export window")]
    Empty,

    #[error("Store query failed: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to write artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The serialized, time-filtered snapshot produced at session end
#[derive(Debug, Clone, Serialize)]
pub struct ExportArtifact {
    /// Suggested filename, `<channel-without-sigil>.json`
    pub filename: String,
    /// Filtered records in capture order
    pub messages: Vec<StoredMessage>,
}

impl ExportArtifact {
    /// Render the record list as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&self.messages)?)
    }

    /// Write the artifact into a directory under its suggested filename.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, self.to_json()?)?;
        Ok(path)
    }
}

/// Reads the store and serializes a session's snapshot
///
/// Export is a pure read: it never mutates the store.
pub struct Exporter {
    store: Arc<dyn MessageStore>,
}

impl Exporter {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Export every stored message with `timestamp >= from`.
    ///
    /// The filename comes from the channel of the most recent filtered
    /// record; an empty window is an error, not an empty file.
    pub fn export(&self, channel: &str, from: DateTime<Utc>) -> Result<ExportArtifact, ExportError> {
        debug!(channel, %from, "exporting captured messages");
        let messages = self.store.query_range(from, None)?;
        let last = messages.last().ok_or(ExportError::Empty)?;
        let filename = format!("{}.json", strip_sigil(&last.message.channel));
        Ok(ExportArtifact { filename, messages })
    }
}
