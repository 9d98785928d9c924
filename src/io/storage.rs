//! The persistence port behind [`TaskStore`](crate::store::TaskStore).
//!
//! Two independent records: the ordered task list and the custom-field
//! registry. Each is read once at hydration and rewritten in full on save.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::io::recovery;
use crate::model::registry::CustomFieldRegistry;
use crate::model::task::Task;

pub const TASKS_FILE: &str = "tasks.json";
pub const FIELDS_FILE: &str = "custom_fields.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("could not read {record}: {source}")]
    Read { record: String, source: io::Error },
    #[error("could not write {record}: {source}")]
    Write { record: String, source: io::Error },
    #[error("{record} is not valid: {source}")]
    Parse {
        record: String,
        source: serde_json::Error,
    },
    #[error("could not serialize {record}: {source}")]
    Serialize {
        record: String,
        source: serde_json::Error,
    },
    #[error("{0}")]
    Unavailable(String),
}

/// Durable key-value store for the two records.
///
/// `load_*` returns `Ok(None)` when the record has never been written.
pub trait Storage {
    fn load_tasks(&mut self) -> Result<Option<Vec<Task>>, StorageError>;
    fn load_fields(&mut self) -> Result<Option<CustomFieldRegistry>, StorageError>;
    fn save_tasks(&mut self, tasks: &[Task]) -> Result<(), StorageError>;
    fn save_fields(&mut self, fields: &CustomFieldRegistry) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// JSON directory
// ---------------------------------------------------------------------------

/// Records stored as pretty-printed JSON files in one directory.
///
/// Writes are atomic (temp file + rename). A failed write puts the content
/// that could not be saved into the directory's recovery log.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    dir: PathBuf,
}

impl JsonStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonStorage { dir: dir.into() }
    }

    fn load<T: DeserializeOwned>(&self, record: &str) -> Result<Option<T>, StorageError> {
        let path = self.dir.join(record);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    record: record.to_string(),
                    source,
                });
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StorageError::Parse {
                record: record.to_string(),
                source,
            })
    }

    fn save<T: Serialize + ?Sized>(&self, record: &str, value: &T) -> Result<(), StorageError> {
        let mut text =
            serde_json::to_string_pretty(value).map_err(|source| StorageError::Serialize {
                record: record.to_string(),
                source,
            })?;
        text.push('\n');

        recovery::atomic_write(&self.dir.join(record), text.as_bytes()).map_err(|source| {
            recovery::log_failed_write(&self.dir, record, &source.to_string(), &text);
            StorageError::Write {
                record: record.to_string(),
                source,
            }
        })
    }
}

impl Storage for JsonStorage {
    fn load_tasks(&mut self) -> Result<Option<Vec<Task>>, StorageError> {
        self.load(TASKS_FILE)
    }

    fn load_fields(&mut self) -> Result<Option<CustomFieldRegistry>, StorageError> {
        self.load(FIELDS_FILE)
    }

    fn save_tasks(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        self.save(TASKS_FILE, tasks)
    }

    fn save_fields(&mut self, fields: &CustomFieldRegistry) -> Result<(), StorageError> {
        self.save(FIELDS_FILE, fields)
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// Records held in memory. Counts writes and can be told to fail them.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    pub tasks: Option<Vec<Task>>,
    pub fields: Option<CustomFieldRegistry>,
    pub task_writes: usize,
    pub field_writes: usize,
    /// When set, every save fails and leaves the stored records untouched
    pub fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose task record already exists
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        MemoryStorage {
            tasks: Some(tasks),
            ..Default::default()
        }
    }

    fn check_writable(&self, record: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            Err(StorageError::Unavailable(format!("{record} is read-only")))
        } else {
            Ok(())
        }
    }
}

impl Storage for MemoryStorage {
    fn load_tasks(&mut self) -> Result<Option<Vec<Task>>, StorageError> {
        Ok(self.tasks.clone())
    }

    fn load_fields(&mut self) -> Result<Option<CustomFieldRegistry>, StorageError> {
        Ok(self.fields.clone())
    }

    fn save_tasks(&mut self, tasks: &[Task]) -> Result<(), StorageError> {
        self.check_writable(TASKS_FILE)?;
        self.tasks = Some(tasks.to_vec());
        self.task_writes += 1;
        Ok(())
    }

    fn save_fields(&mut self, fields: &CustomFieldRegistry) -> Result<(), StorageError> {
        self.check_writable(FIELDS_FILE)?;
        self.fields = Some(fields.clone());
        self.field_writes += 1;
        Ok(())
    }
}
