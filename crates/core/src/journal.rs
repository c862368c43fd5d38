use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::records::JournalRecord;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("could not create journal directory `{path}`: {source}")]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[error("could not append to journal file `{path}`: {source}")]
    Append { path: PathBuf, source: std::io::Error },
    #[error("could not serialize journal record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for append-only records. Durability is the sink's
/// responsibility; callers never read entries back.
pub trait RecordSink: Send + Sync {
    fn append(&self, record: JournalRecord) -> Result<(), JournalError>;
}

/// Line-delimited JSON journal: one file per record kind, one serialized
/// object per line, opened in append mode for every write. Appends from a
/// single process serialize through the append-on-open file mode;
/// multi-process writers are out of scope.
#[derive(Clone, Debug)]
pub struct JsonlJournal {
    dir: PathBuf,
}

impl JsonlJournal {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, JournalError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|source| JournalError::CreateDir { path: dir.clone(), source })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, record: &JournalRecord) -> PathBuf {
        match record {
            JournalRecord::Lead(_) => self.dir.join("leads.jsonl"),
            JournalRecord::Feedback(_) => self.dir.join("feedback.jsonl"),
        }
    }
}

impl RecordSink for JsonlJournal {
    fn append(&self, record: JournalRecord) -> Result<(), JournalError> {
        let path = self.file_for(&record);
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| JournalError::Append { path: path.clone(), source })?;
        file.write_all(line.as_bytes())
            .map_err(|source| JournalError::Append { path, source })?;
        Ok(())
    }
}

/// Test double that keeps appended records in memory.
#[derive(Clone, Default)]
pub struct InMemorySink {
    records: Arc<Mutex<Vec<JournalRecord>>>,
}

impl InMemorySink {
    pub fn records(&self) -> Vec<JournalRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl RecordSink for InMemorySink {
    fn append(&self, record: JournalRecord) -> Result<(), JournalError> {
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
        Ok(())
    }
}
