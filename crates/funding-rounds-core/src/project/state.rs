use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::history::RoundSequence;
use crate::error::FundingRoundsError;
use crate::ownership::{allocate_ownership, OwnershipTable};
use crate::phases::{
    clamp_rate, investor_summary, phase_markers, project_phase, InvestorSummary, PhaseMap,
    PhaseMarker, PhaseProjection, DEFAULT_DISTRIBUTION_RATE, DEFAULT_PHASE_KEY,
};
use crate::rounds::{
    compute_rounds, default_round_name, ordering, Capitalization, Round, RoundId, RoundInput,
};
use crate::types::{Money, Month, Percent};
use crate::FundingRoundsResult;

/// Funding and sale percentage of a round added without explicit values.
const NEW_ROUND_FUNDING: Money = rust_decimal_macros::dec!(100000);
const NEW_ROUND_SOLD_PCT: Percent = rust_decimal_macros::dec!(10);

// ─── Edits ───────────────────────────────────────────────────────────────────

/// Partial update of a round's editable fields. `None` leaves a field as is;
/// an empty `timing` or `notes` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundPatch {
    pub name: Option<String>,
    pub funding_amount: Option<Money>,
    pub sold_percentage: Option<Percent>,
    pub timing: Option<String>,
    pub notes: Option<String>,
}

/// Partial update of a phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhasePatch {
    pub name: Option<String>,
    pub month: Option<Month>,
    pub members: Option<u64>,
    pub annual_profit: Option<Money>,
    pub target: Option<String>,
}

fn non_empty(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

// ─── View ────────────────────────────────────────────────────────────────────

/// Everything the presentation layer renders after an edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectView {
    pub project_name: String,
    pub capitalization: Capitalization,
    pub rounds: Vec<Round>,
    pub ownership: OwnershipTable,
    /// Absent when the current phase key is not in the phase map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<PhaseProjection>,
    pub markers: Vec<PhaseMarker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investor: Option<InvestorSummary>,
}

// ─── State ───────────────────────────────────────────────────────────────────

/// One project: its inputs plus the rounds derived from them.
///
/// The position of a round in `rounds` is its chronological position; ids
/// only identify. Every edit recomputes the whole sequence before returning.
#[derive(Debug, Clone)]
pub struct ProjectState {
    name: String,
    capitalization: Capitalization,
    rounds: Vec<RoundInput>,
    round_counter: u64,
    phases: PhaseMap,
    current_phase: String,
    distribution_rate: Percent,
    computed: Vec<Round>,
}

impl ProjectState {
    /// An empty project with the built-in phases.
    pub fn new(name: impl Into<String>, capitalization: Capitalization) -> Self {
        let mut state = Self {
            name: name.into(),
            capitalization,
            rounds: Vec::new(),
            round_counter: 0,
            phases: PhaseMap::defaults(),
            current_phase: DEFAULT_PHASE_KEY.to_string(),
            distribution_rate: DEFAULT_DISTRIBUTION_RATE,
            computed: Vec::new(),
        };
        state.recompute();
        state
    }

    /// Assemble a project from already-validated parts.
    ///
    /// `round_counter` is raised to the highest id present. An unknown
    /// `current_phase` falls back to the default key, or the first phase.
    pub fn from_parts(
        name: impl Into<String>,
        capitalization: Capitalization,
        rounds: Vec<RoundInput>,
        round_counter: u64,
        phases: PhaseMap,
        current_phase: impl Into<String>,
        distribution_rate: Percent,
    ) -> Self {
        let max_id = rounds.iter().map(|r| r.id.0).max().unwrap_or(0);
        let mut current_phase = current_phase.into();
        if !phases.contains_key(&current_phase) {
            let fallback = if phases.contains_key(DEFAULT_PHASE_KEY) {
                Some(DEFAULT_PHASE_KEY)
            } else {
                phases.keys().next()
            };
            if let Some(key) = fallback {
                tracing::warn!(
                    requested = %current_phase,
                    fallback = key,
                    "current phase not defined; falling back"
                );
                current_phase = key.to_string();
            }
        }

        let mut state = Self {
            name: name.into(),
            capitalization,
            rounds,
            round_counter: round_counter.max(max_id),
            phases,
            current_phase,
            distribution_rate: clamp_rate(distribution_rate),
            computed: Vec::new(),
        };
        state.recompute();
        state
    }

    /// Full recalculation of the round sequence.
    fn recompute(&mut self) {
        self.computed = compute_rounds(&self.capitalization, &self.rounds);
        tracing::debug!(project = %self.name, rounds = self.computed.len(), "project recomputed");
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capitalization(&self) -> &Capitalization {
        &self.capitalization
    }

    /// Editable round fields, in chronological order.
    pub fn inputs(&self) -> &[RoundInput] {
        &self.rounds
    }

    /// Fully computed rounds, in chronological order.
    pub fn rounds(&self) -> &[Round] {
        &self.computed
    }

    pub fn round(&self, id: RoundId) -> Option<&Round> {
        self.computed.iter().find(|r| r.id() == id)
    }

    pub fn round_counter(&self) -> u64 {
        self.round_counter
    }

    pub fn phases(&self) -> &PhaseMap {
        &self.phases
    }

    pub fn current_phase(&self) -> &str {
        &self.current_phase
    }

    pub fn distribution_rate(&self) -> Percent {
        self.distribution_rate
    }

    fn position(&self, id: RoundId) -> FundingRoundsResult<usize> {
        self.rounds
            .iter()
            .position(|r| r.id == id)
            .ok_or(FundingRoundsError::RoundNotFound(id))
    }

    // ── Round edits ──────────────────────────────────────────────────

    fn next_id(&mut self) -> RoundId {
        self.round_counter += 1;
        RoundId(self.round_counter)
    }

    /// Append a round with the default name and terms.
    pub fn add_round(&mut self) -> RoundId {
        let id = self.next_id();
        self.rounds.push(RoundInput::new(
            id,
            default_round_name(id),
            NEW_ROUND_FUNDING,
            NEW_ROUND_SOLD_PCT,
        ));
        self.recompute();
        id
    }

    /// Append a round with explicit terms. Negative amounts are treated as zero.
    pub fn add_round_with(
        &mut self,
        name: impl Into<String>,
        funding_amount: Money,
        sold_percentage: Percent,
        timing: Option<&str>,
    ) -> RoundId {
        let id = self.next_id();
        let name = non_empty(name.into()).unwrap_or_else(|| default_round_name(id));
        let mut round = RoundInput::new(
            id,
            name,
            funding_amount.max(Decimal::ZERO),
            sold_percentage.max(Decimal::ZERO),
        );
        if let Some(timing) = timing {
            round = round.with_timing(timing);
        }
        self.rounds.push(round);
        self.recompute();
        id
    }

    pub fn update_round(&mut self, id: RoundId, patch: RoundPatch) -> FundingRoundsResult<()> {
        let idx = self.position(id)?;
        let round = &mut self.rounds[idx];

        if let Some(name) = patch.name {
            round.name = name;
        }
        if let Some(funding) = patch.funding_amount {
            round.funding_amount = funding.max(Decimal::ZERO);
        }
        if let Some(sold) = patch.sold_percentage {
            round.sold_percentage = sold.max(Decimal::ZERO);
        }
        if let Some(timing) = patch.timing {
            round.timing = non_empty(timing);
        }
        if let Some(notes) = patch.notes {
            round.notes = non_empty(notes);
        }

        self.recompute();
        Ok(())
    }

    /// Remove a round. The last remaining round cannot be deleted. Ids of
    /// the remaining rounds are preserved.
    pub fn delete_round(&mut self, id: RoundId) -> FundingRoundsResult<()> {
        let idx = self.position(id)?;
        if self.rounds.len() <= 1 {
            return Err(FundingRoundsError::LastRoundDeletion);
        }
        self.rounds.remove(idx);

        let max_id = self.rounds.iter().map(|r| r.id.0).max().unwrap_or(0);
        self.round_counter = self.round_counter.max(max_id);

        self.recompute();
        Ok(())
    }

    /// Move a round to `index` in the chronological order (clamped to the end).
    pub fn move_round(&mut self, id: RoundId, index: usize) -> FundingRoundsResult<()> {
        let from = self.position(id)?;
        let round = self.rounds.remove(from);
        let to = index.min(self.rounds.len());
        self.rounds.insert(to, round);
        self.recompute();
        Ok(())
    }

    /// Reorder rounds by the month in their timing. Returns `true` if the
    /// order changed.
    pub fn sort_by_timing(&mut self) -> bool {
        let changed = ordering::sort_by_timing(&mut self.rounds);
        if changed {
            self.recompute();
        }
        changed
    }

    pub fn round_sequence(&self) -> RoundSequence {
        RoundSequence {
            rounds: self.rounds.clone(),
            round_counter: self.round_counter,
        }
    }

    /// Replace the round sequence wholesale (undo/redo).
    ///
    /// The id counter never moves backwards, so an id handed out before an
    /// undo is not issued again to a different round.
    pub fn restore(&mut self, sequence: RoundSequence) {
        self.rounds = sequence.rounds;
        self.round_counter = self.round_counter.max(sequence.round_counter);
        self.recompute();
    }

    // ── Project edits ────────────────────────────────────────────────

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_capitalization(&mut self, capitalization: Capitalization) {
        self.capitalization = capitalization;
        self.recompute();
    }

    pub fn set_current_phase(&mut self, key: &str) -> FundingRoundsResult<()> {
        if !self.phases.contains_key(key) {
            return Err(FundingRoundsError::PhaseNotFound(key.to_string()));
        }
        self.current_phase = key.to_string();
        Ok(())
    }

    pub fn update_phase(&mut self, key: &str, patch: PhasePatch) -> FundingRoundsResult<()> {
        let phase = self
            .phases
            .get_mut(key)
            .ok_or_else(|| FundingRoundsError::PhaseNotFound(key.to_string()))?;

        if let Some(name) = patch.name {
            phase.name = name;
        }
        if let Some(month) = patch.month {
            phase.month = month;
        }
        if let Some(members) = patch.members {
            phase.members = members;
        }
        if let Some(profit) = patch.annual_profit {
            phase.annual_profit = profit;
        }
        if let Some(target) = patch.target {
            phase.target = non_empty(target);
        }
        Ok(())
    }

    /// Set the share of EPS paid out as cash. Clamped to 0–100.
    pub fn set_distribution_rate(&mut self, rate: Percent) {
        self.distribution_rate = clamp_rate(rate);
    }

    // ── Derived views ────────────────────────────────────────────────

    pub fn ownership(&self) -> OwnershipTable {
        allocate_ownership(&self.capitalization, &self.computed)
    }

    /// Projection at the current phase.
    pub fn projection(&self) -> FundingRoundsResult<PhaseProjection> {
        self.projection_at(&self.current_phase)
    }

    pub fn projection_at(&self, phase_key: &str) -> FundingRoundsResult<PhaseProjection> {
        project_phase(
            phase_key,
            &self.phases,
            &self.computed,
            &self.capitalization,
            self.distribution_rate,
        )
    }

    pub fn markers(&self) -> Vec<PhaseMarker> {
        phase_markers(&self.phases, &self.computed)
    }

    pub fn investor_summary(&self) -> Option<InvestorSummary> {
        investor_summary(&self.computed, &self.phases)
    }

    pub fn view(&self) -> ProjectView {
        let projection = match self.projection() {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(error = %e, "phase projection skipped");
                None
            }
        };
        ProjectView {
            project_name: self.name.clone(),
            capitalization: self.capitalization.clone(),
            rounds: self.computed.clone(),
            ownership: self.ownership(),
            projection,
            markers: self.markers(),
            investor: self.investor_summary(),
        }
    }
}
