use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::io::recovery::atomic_write;
use crate::model::task::TaskId;
use crate::ops::filter::TaskFilter;
use crate::store::{SessionParts, UndoStack};
use crate::table::TableState;

/// Per-directory session state (written to .state.json) so that undo/redo and
/// the grid view carry over from one `tg` invocation to the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Undo and redo snapshots
    #[serde(default)]
    pub history: UndoStack,
    /// Task being edited
    #[serde(default)]
    pub editing: Option<TaskId>,
    /// Next id the monotonic policy hands out
    #[serde(default)]
    pub next_id: TaskId,
    #[serde(default)]
    pub filter: TaskFilter,
    #[serde(default)]
    pub table: TableState,
}

impl SessionState {
    /// The part of the session the store owns
    pub fn store_parts(&self) -> SessionParts {
        SessionParts {
            history: self.history.clone(),
            editing: self.editing,
            next_id: self.next_id,
        }
    }

    pub fn set_store_parts(&mut self, parts: SessionParts) {
        self.history = parts.history;
        self.editing = parts.editing;
        self.next_id = parts.next_id;
    }
}

pub fn session_path(dir: &Path) -> PathBuf {
    dir.join(".state.json")
}

/// Read .state.json. A missing or unreadable file is a fresh session.
pub fn read_session(dir: &Path) -> Option<SessionState> {
    let content = std::fs::read_to_string(session_path(dir)).ok()?;
    match serde_json::from_str(&content) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable session state");
            None
        }
    }
}

pub fn write_session(dir: &Path, state: &SessionState) -> Result<(), std::io::Error> {
    let content = serde_json::to_string(state)?;
    atomic_write(&session_path(dir), content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::registry::CustomFieldRegistry;
    use crate::model::snapshot::Snapshot;
    use crate::model::task::{Priority, Status, Task};
    use crate::table::{PageSize, SortState};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();

        let mut history = UndoStack::new(0);
        history.push(Snapshot::new(
            vec![Task {
                id: 1,
                title: "X".into(),
                priority: Priority::Low,
                status: Status::Completed,
                custom_fields: vec![],
            }],
            CustomFieldRegistry::new(),
        ));

        let mut table = TableState::new(PageSize::new(20).unwrap());
        table.sort = Some(SortState::ascending("title"));
        table.current_page = 2;

        let state = SessionState {
            history,
            editing: Some(1),
            next_id: 5,
            filter: TaskFilter {
                search_text: "rel".into(),
                status: Some(Status::NotStarted),
                priority: None,
            },
            table,
        };

        write_session(dir.path(), &state).unwrap();
        let loaded = read_session(dir.path()).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.store_parts().history.undo_len(), 1);
    }

    #[test]
    fn read_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_session(dir.path()).is_none());
    }

    #[test]
    fn read_malformed_json_returns_none() {
        let dir = TempDir::new().unwrap();
        fs::write(session_path(dir.path()), "not json {{{").unwrap();
        assert!(read_session(dir.path()).is_none());
    }

    #[test]
    fn serde_defaults_on_empty_object() {
        let state: SessionState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, SessionState::default());
        assert_eq!(state.table.current_page, 1);
        assert_eq!(state.table.page_size.get(), 10);
    }
}
