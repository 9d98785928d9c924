use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// Append-only log beside the data records, one JSON object per line
pub const RECOVERY_FILE: &str = ".recovery.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryCategory {
    /// A record could not be written; the body holds its full content
    Write,
    /// A task was deleted; the body holds the task as it was
    Delete,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecoveryCategory::Write => "write",
            RecoveryCategory::Delete => "delete",
        })
    }
}

/// Something the user may want back: a record that never reached disk, or
/// a task removed on purpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: IndexMap::new(),
            body: String::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

pub fn recovery_log_path(dir: &Path) -> PathBuf {
    dir.join(RECOVERY_FILE)
}

/// Replace `path` through a temp file in the same directory and a rename
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append an entry. Failure is logged and otherwise ignored.
pub fn log_recovery(dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(dir, &entry) {
        tracing::warn!(error = %e, "could not write to recovery log");
    }
}

fn append_entry(dir: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(recovery_log_path(dir))?;
    file.write_all(line.as_bytes())
}

/// Record the full content of a record that could not be saved
pub fn log_failed_write(dir: &Path, record: &str, error: &str, content: &str) {
    log_recovery(
        dir,
        RecoveryEntry::new(RecoveryCategory::Write, format!("{} not saved", record))
            .with_field("record", record)
            .with_field("error", error)
            .with_body(content),
    );
}

/// Keep a copy of a deleted task
pub fn log_task_deletion(dir: &Path, task_id: u64, task_json: &str) {
    log_recovery(
        dir,
        RecoveryEntry::new(RecoveryCategory::Delete, format!("task {} deleted", task_id))
            .with_field("task", task_id.to_string())
            .with_body(task_json),
    );
}

/// Entries, most recent first, at most `limit` of them. Lines that do not
/// parse are skipped.
pub fn read_recovery_entries(dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(file) = std::fs::File::open(recovery_log_path(dir)) else {
        return Vec::new();
    };

    let mut entries: Vec<RecoveryEntry> = BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(&line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping recovery log line");
                None
            }
        })
        .collect();

    entries.reverse();
    if let Some(n) = limit {
        entries.truncate(n);
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tasks.json");
        atomic_write(&path, b"[1]").unwrap();
        atomic_write(&path, b"[2]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[2]");
    }

    #[test]
    fn test_log_and_read_back() {
        let tmp = TempDir::new().unwrap();
        log_failed_write(tmp.path(), "tasks.json", "disk full", "[\n  {}\n]");
        log_task_deletion(tmp.path(), 7, "{\"id\": 7}");

        let entries = read_recovery_entries(tmp.path(), None);
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].category, RecoveryCategory::Delete);
        assert_eq!(entries[0].description, "task 7 deleted");
        assert_eq!(entries[0].body, "{\"id\": 7}");

        assert_eq!(entries[1].category, RecoveryCategory::Write);
        assert_eq!(entries[1].fields["record"], "tasks.json");
        assert_eq!(entries[1].fields["error"], "disk full");
        assert_eq!(entries[1].body, "[\n  {}\n]");
    }

    #[test]
    fn test_one_line_per_entry() {
        let tmp = TempDir::new().unwrap();
        log_task_deletion(tmp.path(), 1, "{\n  \"id\": 1\n}");
        log_task_deletion(tmp.path(), 2, "{}");
        let content = std::fs::read_to_string(recovery_log_path(tmp.path())).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.lines().next().unwrap().contains("\"category\":\"delete\""));
    }

    #[test]
    fn test_limit_keeps_most_recent() {
        let tmp = TempDir::new().unwrap();
        for id in 1..=3 {
            log_task_deletion(tmp.path(), id, "{}");
        }
        let entries = read_recovery_entries(tmp.path(), Some(2));
        let descriptions: Vec<&str> = entries.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(descriptions, vec!["task 3 deleted", "task 2 deleted"]);
    }

    #[test]
    fn test_garbage_lines_skipped() {
        let tmp = TempDir::new().unwrap();
        log_task_deletion(tmp.path(), 1, "{}");
        let mut file = OpenOptions::new()
            .append(true)
            .open(recovery_log_path(tmp.path()))
            .unwrap();
        file.write_all(b"not json\n\n").unwrap();
        log_task_deletion(tmp.path(), 2, "{}");

        assert_eq!(read_recovery_entries(tmp.path(), None).len(), 2);
    }

    #[test]
    fn test_missing_log_reads_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_recovery_entries(tmp.path(), Some(5)).is_empty());
    }
}
