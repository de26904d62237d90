use super::defaults::default_project;
use super::history::History;
use super::snapshot::ProjectSnapshot;
use super::state::{PhasePatch, ProjectState, ProjectView, RoundPatch};
use super::store::ProjectStore;
use crate::rounds::{Capitalization, RoundId};
use crate::types::{Money, Percent};
use crate::FundingRoundsResult;

/// An open project: state, undo history and the store it saves to.
///
/// Every successful edit is followed by exactly one save attempt. A failed
/// save is logged and remembered but never retried; the in-memory state
/// stays authoritative and the next edit saves again.
#[derive(Debug)]
pub struct ProjectSession<S: ProjectStore> {
    state: ProjectState,
    history: History,
    store: S,
    last_save_error: Option<String>,
}

impl<S: ProjectStore> ProjectSession<S> {
    /// Load the project from `store`.
    ///
    /// A missing or round-less snapshot is replaced by the default project,
    /// which is saved straight away. A snapshot that exists but cannot be
    /// read is an error and the store is left untouched.
    pub fn open(mut store: S) -> FundingRoundsResult<Self> {
        let loaded = match store.load()? {
            Some(snapshot) if !snapshot.rounds.is_empty() => Some(snapshot.into_state()),
            Some(_) => {
                tracing::warn!("saved project has no rounds; using the default project");
                None
            }
            None => {
                tracing::info!("no saved project; using the default project");
                None
            }
        };

        let needs_save = loaded.is_none();
        let mut session = Self::with_state(loaded.unwrap_or_else(default_project), store);
        if needs_save {
            session.persist();
        }
        Ok(session)
    }

    /// Wrap an existing state without loading or saving.
    pub fn with_state(state: ProjectState, store: S) -> Self {
        Self {
            state,
            history: History::new(),
            store,
            last_save_error: None,
        }
    }

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    pub fn view(&self) -> ProjectView {
        self.state.view()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Error from the most recent save attempt, if it failed.
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Save the current state now, outside any edit.
    pub fn save(&mut self) {
        self.persist();
    }

    fn persist(&mut self) {
        let snapshot = ProjectSnapshot::from_state(&self.state);
        match self.store.save(&snapshot) {
            Ok(()) => {
                tracing::debug!(project = %self.state.name(), "project saved");
                self.last_save_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to save project");
                self.last_save_error = Some(e.to_string());
            }
        }
    }

    /// Apply an edit to the round sequence.
    ///
    /// The sequence before the edit enters the undo history only if the edit
    /// succeeds and actually changes the sequence.
    pub fn edit_rounds<T>(
        &mut self,
        edit: impl FnOnce(&mut ProjectState) -> FundingRoundsResult<T>,
    ) -> FundingRoundsResult<T> {
        let before = self.state.round_sequence();
        let out = edit(&mut self.state)?;
        if self.state.round_sequence() != before {
            self.history.record(before);
        }
        self.persist();
        Ok(out)
    }

    /// Apply an edit outside the round sequence. Not undoable.
    pub fn edit<T>(
        &mut self,
        edit: impl FnOnce(&mut ProjectState) -> FundingRoundsResult<T>,
    ) -> FundingRoundsResult<T> {
        let out = edit(&mut self.state)?;
        self.persist();
        Ok(out)
    }

    // ── Round edits ──────────────────────────────────────────────────

    pub fn add_round(&mut self) -> RoundId {
        let before = self.state.round_sequence();
        let id = self.state.add_round();
        self.history.record(before);
        self.persist();
        id
    }

    pub fn add_round_with(
        &mut self,
        name: &str,
        funding_amount: Money,
        sold_percentage: Percent,
        timing: Option<&str>,
    ) -> RoundId {
        let before = self.state.round_sequence();
        let id = self
            .state
            .add_round_with(name, funding_amount, sold_percentage, timing);
        self.history.record(before);
        self.persist();
        id
    }

    pub fn update_round(&mut self, id: RoundId, patch: RoundPatch) -> FundingRoundsResult<()> {
        self.edit_rounds(|s| s.update_round(id, patch))
    }

    pub fn delete_round(&mut self, id: RoundId) -> FundingRoundsResult<()> {
        self.edit_rounds(|s| s.delete_round(id))
    }

    pub fn move_round(&mut self, id: RoundId, index: usize) -> FundingRoundsResult<()> {
        self.edit_rounds(|s| s.move_round(id, index))
    }

    /// Returns `true` if the order changed. An unchanged order is neither
    /// recorded nor saved.
    pub fn sort_by_timing(&mut self) -> bool {
        let before = self.state.round_sequence();
        if !self.state.sort_by_timing() {
            return false;
        }
        self.history.record(before);
        self.persist();
        true
    }

    // ── Project edits ────────────────────────────────────────────────

    pub fn rename(&mut self, name: &str) {
        self.state.rename(name);
        self.persist();
    }

    pub fn set_capitalization(&mut self, capitalization: Capitalization) {
        self.state.set_capitalization(capitalization);
        self.persist();
    }

    pub fn set_current_phase(&mut self, key: &str) -> FundingRoundsResult<()> {
        self.edit(|s| s.set_current_phase(key))
    }

    pub fn update_phase(&mut self, key: &str, patch: PhasePatch) -> FundingRoundsResult<()> {
        self.edit(|s| s.update_phase(key, patch))
    }

    pub fn set_distribution_rate(&mut self, rate: Percent) {
        self.state.set_distribution_rate(rate);
        self.persist();
    }

    // ── History ──────────────────────────────────────────────────────

    /// Step back one round-sequence edit. Returns `false` if there is none.
    pub fn undo(&mut self) -> bool {
        let current = self.state.round_sequence();
        match self.history.undo(current) {
            Some(previous) => {
                tracing::info!(remaining = self.history.undo_depth(), "undo");
                self.state.restore(previous);
                self.persist();
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.state.round_sequence();
        match self.history.redo(current) {
            Some(next) => {
                tracing::info!(remaining = self.history.redo_depth(), "redo");
                self.state.restore(next);
                self.persist();
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FundingRoundsError;
    use crate::project::MemoryStore;
    use rust_decimal_macros::dec;

    fn session() -> ProjectSession<MemoryStore> {
        ProjectSession::open(MemoryStore::new()).unwrap()
    }

    #[test]
    fn test_open_empty_store_saves_default() {
        let s = session();
        assert_eq!(s.state().rounds().len(), 4);
        assert_eq!(s.store().saves(), 1);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_round_edit_is_undoable_and_saved() {
        let mut s = session();
        s.delete_round(RoundId(3)).unwrap();
        assert_eq!(s.state().rounds().len(), 3);
        assert_eq!(s.store().saves(), 2);
        assert_eq!(s.store().snapshot().unwrap().rounds.len(), 3);

        assert!(s.undo());
        assert_eq!(s.state().rounds().len(), 4);
        assert!(s.redo());
        assert_eq!(s.state().rounds().len(), 3);
        assert!(!s.redo());
    }

    #[test]
    fn test_rejected_edit_records_nothing() {
        let mut s = session();
        let err = s.delete_round(RoundId(99)).unwrap_err();
        assert!(matches!(err, FundingRoundsError::RoundNotFound(_)));
        assert!(!s.can_undo());
        assert_eq!(s.store().saves(), 1);
    }

    #[test]
    fn test_project_edits_do_not_enter_history() {
        let mut s = session();
        s.set_distribution_rate(dec!(50));
        s.set_current_phase("good").unwrap();
        s.rename("Renamed");
        assert!(!s.can_undo());
        assert_eq!(s.store().snapshot().unwrap().project_name, "Renamed");
    }

    #[test]
    fn test_failed_save_keeps_state() {
        let mut s = session();
        s.store_mut().set_fail_saves(true);
        let id = s.add_round();
        assert!(s.last_save_error().is_some());
        assert!(s.state().round(id).is_some());
        assert_eq!(s.store().snapshot().unwrap().rounds.len(), 4);

        s.store_mut().set_fail_saves(false);
        s.set_distribution_rate(dec!(40));
        assert!(s.last_save_error().is_none());
        assert_eq!(s.store().snapshot().unwrap().rounds.len(), 5);
    }

    #[test]
    fn test_sort_without_change_is_silent() {
        let mut s = session();
        assert!(!s.sort_by_timing());
        assert!(!s.can_undo());
        assert_eq!(s.store().saves(), 1);
    }
}
