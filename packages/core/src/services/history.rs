//! Undo/redo stacks for one document
//!
//! The undo stack is bounded: recording beyond capacity evicts the oldest
//! record. The redo stack needs no bound of its own since it only ever holds
//! records popped from the undo stack, and every fresh record clears it.

use crate::operations::CommitRecord;
use crate::state::HistoryStatus;
use serde::Serialize;
use std::collections::VecDeque;

/// Labels of both stacks, most recent last
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLabels {
    pub undo: Vec<String>,
    pub redo: Vec<String>,
}

#[derive(Debug)]
pub struct History {
    undo: VecDeque<CommitRecord>,
    redo: Vec<CommitRecord>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record a fresh commit, clearing forward history.
    ///
    /// Returns the record evicted to stay within capacity, if any.
    pub fn record(&mut self, commit: CommitRecord) -> Option<CommitRecord> {
        self.redo.clear();
        self.undo.push_back(commit);
        if self.undo.len() > self.capacity {
            self.undo.pop_front()
        } else {
            None
        }
    }

    pub fn pop_undo(&mut self) -> Option<CommitRecord> {
        self.undo.pop_back()
    }

    pub fn pop_redo(&mut self) -> Option<CommitRecord> {
        self.redo.pop()
    }

    /// Return a record to the undo stack without touching redo
    pub fn push_undo(&mut self, commit: CommitRecord) {
        self.undo.push_back(commit);
    }

    pub fn push_redo(&mut self, commit: CommitRecord) {
        self.redo.push(commit);
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            undo_len: self.undo.len(),
            redo_len: self.redo.len(),
        }
    }

    pub fn labels(&self) -> HistoryLabels {
        HistoryLabels {
            undo: self.undo.iter().map(|record| record.label.clone()).collect(),
            redo: self.redo.iter().map(|record| record.label.clone()).collect(),
        }
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
