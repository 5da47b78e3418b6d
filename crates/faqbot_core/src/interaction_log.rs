use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Column order of the interaction log.
pub const LOG_COLUMNS: [&str; 7] = [
    "timestamp",
    "raw_query",
    "matched_intent",
    "matched_question",
    "matched_answer",
    "score",
    "accepted",
];

/// One query, its best match and the gate's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: DateTime<Utc>,
    pub raw_query: String,
    pub matched_intent: Option<String>,
    pub matched_question: String,
    pub matched_answer: String,
    pub score: f32,
    pub accepted: bool,
}

/// Append-only destination for interaction records.
pub trait InteractionSink: Send + Sync {
    fn append(&self, record: &InteractionRecord) -> Result<()>;
}

/// CSV file log. Appends are serialized and synced to disk before returning.
#[derive(Debug)]
pub struct CsvInteractionLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvInteractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InteractionSink for CsvInteractionLog {
    fn append(&self, record: &InteractionRecord) -> Result<()> {
        let _guard = self.lock.lock();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let write_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&file);
        if write_header {
            writer.write_record(LOG_COLUMNS)?;
        }
        writer.serialize(record)?;
        writer.flush()?;
        drop(writer);
        file.sync_data()?;

        debug!(path = %self.path.display(), header = write_header, "interaction logged");
        Ok(())
    }
}

/// In-memory log, handy for embedding the engine and for tests.
#[derive(Debug, Default)]
pub struct MemoryInteractionLog {
    records: Mutex<Vec<InteractionRecord>>,
}

impl MemoryInteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<InteractionRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl InteractionSink for MemoryInteractionLog {
    fn append(&self, record: &InteractionRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}
