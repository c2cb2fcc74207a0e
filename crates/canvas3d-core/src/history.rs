//! Undo/redo history of layer snapshots.

use crate::layer::Layer;
use std::collections::VecDeque;
use thiserror::Error;

/// Default number of snapshots kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("nothing to undo")]
    AtBeginning,

    #[error("nothing to redo")]
    AtEnd,
}

/// Snapshot history with a cursor pointing at the current state.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<Vec<Layer>>,
    cursor: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a snapshot, dropping anything that could have been redone.
    pub fn push(&mut self, snapshot: Vec<Layer>) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Step back and return the snapshot there.
    pub fn undo(&mut self) -> Result<Vec<Layer>, HistoryError> {
        if !self.can_undo() {
            return Err(HistoryError::AtBeginning);
        }
        self.cursor -= 1;
        Ok(self.snapshots[self.cursor].clone())
    }

    /// Step forward and return the snapshot there.
    pub fn redo(&mut self) -> Result<Vec<Layer>, HistoryError> {
        if !self.can_redo() {
            return Err(HistoryError::AtEnd);
        }
        self.cursor += 1;
        Ok(self.snapshots[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
