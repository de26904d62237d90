use std::collections::VecDeque;

use crate::rounds::RoundInput;

/// Number of undo steps kept unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Immutable copy of the editable round sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSequence {
    pub rounds: Vec<RoundInput>,
    pub round_counter: u64,
}

/// Linear undo/redo over round-sequence snapshots.
///
/// The undo side is a bounded ring: once full, the oldest snapshot is
/// dropped. Recording a new edit discards everything on the redo side.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<RoundSequence>,
    redo: Vec<RoundSequence>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `limit` undo steps (at least one).
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            undo: VecDeque::with_capacity(limit),
            redo: Vec::new(),
            limit,
        }
    }

    fn push_undo(&mut self, snapshot: RoundSequence) {
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
    }

    /// Remember the sequence as it was before an edit.
    pub fn record(&mut self, before: RoundSequence) {
        self.push_undo(before);
        self.redo.clear();
    }

    /// Step back. `current` moves to the redo side; the previous snapshot is
    /// returned for the caller to restore.
    pub fn undo(&mut self, current: RoundSequence) -> Option<RoundSequence> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: RoundSequence) -> Option<RoundSequence> {
        let next = self.redo.pop()?;
        self.push_undo(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
