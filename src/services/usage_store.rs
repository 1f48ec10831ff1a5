//! File-backed store for the two usage documents.
//!
//! State is small (a handful of counters plus a bounded transcript), so
//! every save rewrites the whole document. Writes go through a temp file
//! in the same directory and a rename, so readers never observe a
//! partial document.

use crate::models::usage::{ChatHistoryItem, UsageStats};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const STATS_FILE: &str = "usage_stats.json";
const HISTORY_FILE: &str = "chat_history.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tagged outcome of loading a durable document. Fallbacks carry the
/// reason so the caller can log them without the load ever failing.
#[derive(Debug)]
pub enum LoadOutcome<T> {
    Loaded(T),
    Missing,
    Invalid { reason: String },
}

pub struct UsageStore {
    data_dir: PathBuf,
    stats_path: PathBuf,
    history_path: PathBuf,
}

impl UsageStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        let stats_path = data_dir.join(STATS_FILE);
        let history_path = data_dir.join(HISTORY_FILE);

        Ok(Self {
            data_dir,
            stats_path,
            history_path,
        })
    }

    pub fn load_stats(&self) -> LoadOutcome<UsageStats> {
        load_document(&self.stats_path)
    }

    pub fn load_history(&self) -> LoadOutcome<Vec<ChatHistoryItem>> {
        load_document(&self.history_path)
    }

    pub fn save_stats(&self, stats: &UsageStats) -> Result<(), StoreError> {
        self.save_document(&self.stats_path, stats)
    }

    pub fn save_history(&self, history: &[ChatHistoryItem]) -> Result<(), StoreError> {
        self.save_document(&self.history_path, history)
    }

    fn save_document<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.data_dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

        Ok(())
    }
}

fn load_document<T: DeserializeOwned>(path: &Path) -> LoadOutcome<T> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadOutcome::Missing,
        Err(e) => {
            return LoadOutcome::Invalid {
                reason: e.to_string(),
            }
        }
    };

    match serde_json::from_str(&text) {
        Ok(value) => LoadOutcome::Loaded(value),
        Err(e) => LoadOutcome::Invalid {
            reason: e.to_string(),
        },
    }
}
