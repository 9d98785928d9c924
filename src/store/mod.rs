//! The task state container.
//!
//! A [`TaskStore`] owns the current [`Snapshot`] (task list + field registry),
//! the undo/redo history and the editing cursor. Every mutation goes through
//! the pure [`task_ops::apply`] transition and is then written through to the
//! injected [`Storage`] port.
//!
//! The store does no input validation: an empty title or a duplicate field
//! name is the caller's problem. It only fails for storage errors and for
//! mutations attempted before [`TaskStore::init`].

pub mod undo;

use std::rc::Rc;

use crate::io::storage::{Storage, StorageError};
use crate::model::config::StoreSection;
use crate::model::field::CustomFieldDefinition;
use crate::model::registry::CustomFieldRegistry;
use crate::model::snapshot::Snapshot;
use crate::model::task::{Task, TaskDraft, TaskId, TaskPatch};
use crate::ops::task_ops::{self, Command, Records};

pub use undo::UndoStack;

const DEFAULT_TASKS: &str = include_str!("../templates/default_tasks.json");

/// The task list used when no task record has been written yet
pub fn default_tasks() -> Result<Vec<Task>, serde_json::Error> {
    serde_json::from_str(DEFAULT_TASKS)
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("store has not been loaded yet")]
    NotHydrated,
    #[error("built-in task list is invalid: {0}")]
    DefaultTasks(#[from] serde_json::Error),
}

/// Session data that outlives a single process: history, cursor, id counter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionParts {
    pub history: UndoStack,
    pub editing: Option<TaskId>,
    pub next_id: TaskId,
}

pub struct TaskStore<S> {
    storage: S,
    config: StoreSection,
    current: Snapshot,
    history: UndoStack,
    editing: Option<TaskId>,
    hydrated: bool,
    /// Next id under the monotonic policy; never moves backwards
    next_id: TaskId,
    /// Records whose last write failed
    dirty: Records,
}

impl<S: Storage> TaskStore<S> {
    /// An empty, not yet hydrated store
    pub fn new(storage: S, config: StoreSection) -> Self {
        let history = UndoStack::new(config.history_limit);
        TaskStore {
            storage,
            config,
            current: Snapshot::default(),
            history,
            editing: None,
            hydrated: false,
            next_id: 1,
            dirty: Records::NONE,
        }
    }

    /// `new` followed by `init`
    pub fn open(storage: S, config: StoreSection) -> Result<Self, StoreError> {
        let mut store = TaskStore::new(storage, config);
        store.init()?;
        Ok(store)
    }

    /// Load both records and flip the hydration flag.
    ///
    /// An absent task record loads the built-in default list; an absent
    /// registry loads empty. Tasks are brought into lock-step with the
    /// registry, in case the files were edited by hand.
    pub fn init(&mut self) -> Result<(), StoreError> {
        let tasks = match self.storage.load_tasks()? {
            Some(tasks) => tasks,
            None => {
                tracing::debug!("no task record, using default tasks");
                default_tasks()?
            }
        };
        let fields = self.storage.load_fields()?.unwrap_or_default();
        let (tasks, reconciled) = reconcile(tasks, &fields);
        if reconciled > 0 {
            tracing::warn!(tasks = reconciled, "custom fields out of step with registry, repaired");
        }

        self.current = Snapshot::new(tasks, fields);
        self.history = UndoStack::new(self.config.history_limit);
        self.editing = None;
        self.next_id = self.current.max_id() + 1;
        self.dirty = Records::NONE;
        self.hydrated = true;

        tracing::info!(
            tasks = self.current.tasks.len(),
            fields = self.current.fields.len(),
            "store hydrated"
        );
        Ok(())
    }

    /// Tear down the store, retrying any failed writes first, and hand back
    /// the storage.
    pub fn dispose(mut self) -> Result<S, StoreError> {
        if !self.dirty.is_empty() {
            self.flush()?;
        }
        tracing::info!(undo = self.history.undo_len(), "store disposed");
        Ok(self.storage)
    }

    // -- reads --

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.current
    }

    pub fn tasks(&self) -> &[Task] {
        self.current.tasks()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.current.task(id)
    }

    pub fn fields(&self) -> &CustomFieldRegistry {
        self.current.fields()
    }

    pub fn editing(&self) -> Option<TaskId> {
        self.editing
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn dirty(&self) -> Records {
        self.dirty
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // -- mutations --

    /// Prepend a new task seeded with every registered field's default.
    /// Returns the id it was given.
    pub fn add_task(&mut self, draft: TaskDraft) -> Result<TaskId, StoreError> {
        self.ensure_hydrated()?;
        let id = task_ops::next_id(&self.current, self.config.id_policy, self.next_id);
        self.next_id = self.next_id.max(id + 1);
        self.execute(Command::AddTask { id, draft })?;
        Ok(id)
    }

    /// Shallow-merge `patch` onto the task and clear the editing cursor.
    /// An unknown id changes nothing but still records a history entry.
    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> Result<(), StoreError> {
        self.ensure_hydrated()?;
        self.editing = None;
        self.execute(Command::UpdateTask { id, patch })
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<(), StoreError> {
        self.ensure_hydrated()?;
        if self.editing == Some(id) {
            self.editing = None;
        }
        self.execute(Command::DeleteTask { id })
    }

    /// Register `def` (last write wins) and seed it on every task
    pub fn add_custom_field(&mut self, def: CustomFieldDefinition) -> Result<(), StoreError> {
        self.ensure_hydrated()?;
        self.execute(Command::AddField(def))
    }

    /// Unregister `name` and strip it from every task. Both records are
    /// rewritten.
    pub fn remove_custom_field(&mut self, name: &str) -> Result<(), StoreError> {
        self.ensure_hydrated()?;
        self.execute(Command::RemoveField(name.to_string()))
    }

    /// Restore the state before the last mutation. Returns `false` when the
    /// undo stack is empty.
    pub fn undo(&mut self) -> Result<bool, StoreError> {
        self.ensure_hydrated()?;
        let Some(previous) = self.history.undo(self.current.clone()) else {
            return Ok(false);
        };
        tracing::debug!(undo = self.history.undo_len(), "undo");
        self.restore(previous)?;
        Ok(true)
    }

    /// Re-apply the last undone state. Returns `false` when the redo stack is
    /// empty.
    pub fn redo(&mut self) -> Result<bool, StoreError> {
        self.ensure_hydrated()?;
        let Some(next) = self.history.redo(self.current.clone()) else {
            return Ok(false);
        };
        tracing::debug!(redo = self.history.redo_len(), "redo");
        self.restore(next)?;
        Ok(true)
    }

    /// Set or clear the task being edited. Does not touch history.
    pub fn set_editing(&mut self, id: Option<TaskId>) {
        self.editing = id;
    }

    /// Retry writes that failed earlier
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.write_dirty()
    }

    // -- session --

    pub fn session(&self) -> SessionParts {
        SessionParts {
            history: self.history.clone(),
            editing: self.editing,
            next_id: self.next_id,
        }
    }

    /// Reattach history saved by an earlier process. Call after `init`.
    pub fn restore_session(&mut self, parts: SessionParts) {
        let SessionParts {
            mut history,
            editing,
            next_id,
        } = parts;
        history.set_limit(self.config.history_limit);
        self.history = history;
        self.editing = editing;
        self.next_id = self.next_id.max(next_id);
    }

    // -- internals --

    fn ensure_hydrated(&self) -> Result<(), StoreError> {
        if self.hydrated {
            Ok(())
        } else {
            Err(StoreError::NotHydrated)
        }
    }

    fn execute(&mut self, command: Command) -> Result<(), StoreError> {
        let before = self.current.clone();
        let after = task_ops::apply(&before, &command);
        tracing::debug!(
            command = command.name(),
            before = before.tasks.len(),
            after = after.tasks.len(),
            "applied"
        );
        self.history.push(before);
        self.current = after;
        self.dirty = self.dirty.union(command.records());
        self.write_dirty()
    }

    fn restore(&mut self, snapshot: Snapshot) -> Result<(), StoreError> {
        // History reloaded from disk shares no pointers with the live state,
        // so fall back to comparing contents
        let changed = Records {
            tasks: !same_half(&snapshot.tasks, &self.current.tasks),
            fields: !same_half(&snapshot.fields, &self.current.fields),
        };
        self.current = snapshot;
        self.dirty = self.dirty.union(changed);
        self.write_dirty()
    }

    /// Write every dirty record. Each record is attempted even if another
    /// fails; the first error is returned and the failed records stay dirty.
    fn write_dirty(&mut self) -> Result<(), StoreError> {
        let mut first_error = None;

        if self.dirty.tasks {
            match self.storage.save_tasks(&self.current.tasks) {
                Ok(()) => self.dirty.tasks = false,
                Err(e) => {
                    tracing::warn!(error = %e, "task list not saved");
                    first_error.get_or_insert(e);
                }
            }
        }
        if self.dirty.fields {
            match self.storage.save_fields(&self.current.fields) {
                Ok(()) => self.dirty.fields = false,
                Err(e) => {
                    tracing::warn!(error = %e, "field registry not saved");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

fn same_half<T: PartialEq>(a: &Rc<T>, b: &Rc<T>) -> bool {
    Rc::ptr_eq(a, b) || a == b
}

/// Rebuild every task's custom fields in registry order, keeping values whose
/// name and type match and seeding the rest. Returns the tasks and how many
/// of them changed.
fn reconcile(tasks: Vec<Task>, fields: &CustomFieldRegistry) -> (Vec<Task>, usize) {
    let mut changed = 0;
    let tasks = tasks
        .into_iter()
        .map(|mut task| {
            let rebuilt: Vec<_> = fields
                .iter()
                .map(|def| match task.field(&def.name) {
                    Some(value) if value.field_type == def.field_type && value.is_consistent() => {
                        value.clone()
                    }
                    _ => def.seed_value(),
                })
                .collect();
            if rebuilt != task.custom_fields {
                changed += 1;
                task.custom_fields = rebuilt;
            }
            task
        })
        .collect();
    (tasks, changed)
}
