//! Append-only log of delivered transcripts.
//!
//! One JSON object per line. Reads skip lines that fail to parse so a torn
//! final write never hides the rest of the history.

use crate::{CoreError, CoreResult};

use std::{
    fs::{self, File, OpenOptions},
    io::{BufRead, BufReader, Write},
    panic::Location,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, Utc};
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// One delivered transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique entry id.
    pub id: Uuid,
    /// When the transcript was delivered.
    pub timestamp: DateTime<Utc>,
    /// The transcript text.
    pub text: String,
}

impl HistoryEntry {
    /// Stamp a new entry with a fresh id and the current time.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            text: text.into(),
        }
    }
}

/// Where the controller records successful transcripts.
pub trait HistoryLog: Send + Sync {
    /// Record `text`, returning the stored entry.
    fn append(&self, text: &str) -> CoreResult<HistoryEntry>;
}

/// JSON-lines history file.
pub struct JsonlHistory {
    path: PathBuf,
    // Serializes appends against rewrites from delete/clear.
    lock: Mutex<()>,
}

impl JsonlHistory {
    /// Open (or prepare to create) the history file at `path`.
    #[track_caller]
    #[instrument]
    pub fn open(path: &Path) -> CoreResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
            debug!(dir = ?parent, "Created history directory");
        }

        info!(path = ?path, "History log opened");

        Ok(Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries newest first, at most `limit` of them.
    #[instrument(skip(self))]
    pub fn recent(&self, limit: Option<usize>) -> CoreResult<Vec<HistoryEntry>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.read_all()?;
        entries.reverse();
        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        Ok(entries)
    }

    /// Remove the entry with `id`. Returns whether one was removed.
    #[instrument(skip(self))]
    pub fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut entries = self.read_all()?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);

        if entries.len() == before {
            return Ok(false);
        }

        self.rewrite(&entries)?;
        info!(entry_id = %id, "History entry deleted");

        Ok(true)
    }

    /// Drop every entry.
    #[instrument(skip(self))]
    pub fn clear(&self) -> CoreResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        self.rewrite(&[])?;
        info!("History cleared");

        Ok(())
    }

    fn read_all(&self) -> CoreResult<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(line = index + 1, error = %e, "Skipping malformed history line"),
            }
        }

        Ok(entries)
    }

    /// Replace the file contents via temp file + rename.
    #[track_caller]
    fn rewrite(&self, entries: &[HistoryEntry]) -> CoreResult<()> {
        let temp_path = self.path.with_extension("jsonl.tmp");

        let mut temp_file = File::create(&temp_path).map_err(|e| CoreError::History {
            reason: format!("Failed to create temp history file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        for entry in entries {
            let line = serde_json::to_string(entry)?;
            writeln!(temp_file, "{}", line)?;
        }

        temp_file.sync_all()?;

        fs::rename(&temp_path, &self.path).map_err(|e| CoreError::History {
            reason: format!("Failed to replace history file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(())
    }
}

impl HistoryLog for JsonlHistory {
    #[track_caller]
    fn append(&self, text: &str) -> CoreResult<HistoryEntry> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let entry = HistoryEntry::new(text);
        let line = serde_json::to_string(&entry)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| CoreError::History {
                reason: format!("Failed to open history file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        writeln!(file, "{}", line)?;

        debug!(entry_id = %entry.id, text_len = text.len(), "History entry appended");

        Ok(entry)
    }
}
