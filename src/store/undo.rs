use serde::{Deserialize, Serialize};

use crate::model::snapshot::Snapshot;

/// Linear undo/redo history of whole-store snapshots.
///
/// Snapshots share unchanged halves through `Rc`, so a history of task edits
/// holds one registry, not one per entry. The sharing does not survive
/// serialization: a stack saved to `.state.json` stores every entry in full,
/// so its size is bounded by the history limit times the record sizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoStack {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    /// Maximum undo depth. 0 means unbounded.
    #[serde(skip)]
    limit: usize,
}

impl UndoStack {
    pub fn new(limit: usize) -> Self {
        UndoStack {
            undo: Vec::new(),
            redo: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Change the depth cap, dropping the oldest entries if now over it
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.trim();
    }

    /// Record the state before a mutation. Clears the redo stack.
    pub fn push(&mut self, before: Snapshot) {
        self.undo.push(before);
        self.trim();
        self.redo.clear();
    }

    /// Step back: returns the snapshot to restore, and remembers `current`
    /// for redo. `None` (and no change) when there is nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward again after an undo
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push(current);
        self.trim();
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    fn trim(&mut self) {
        if self.limit > 0 && self.undo.len() > self.limit {
            self.undo.drain(..self.undo.len() - self.limit);
        }
    }
}
