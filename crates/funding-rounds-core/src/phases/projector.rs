use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::model::PhaseMap;
use crate::coerce::{percent_change, percent_of, safe_div};
use crate::error::FundingRoundsError;
use crate::rounds::{Capitalization, Round, RoundId};
use crate::types::{elapsed_us, with_metadata, ComputationOutput, Money, Month, Percent, Shares};
use crate::FundingRoundsResult;

const HUNDRED: Decimal = dec!(100);

/// Distribution rate used when a project does not configure one.
pub const DEFAULT_DISTRIBUTION_RATE: Percent = dec!(30);

/// Label used for the phase round when the project has no rounds yet.
const FOUNDING_LABEL: &str = "Founding";

// ─── Structs ─────────────────────────────────────────────────────────────────

/// Per-share economics at one phase of the growth plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseProjection {
    pub phase_key: String,
    pub phase_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub month: Month,
    pub annual_profit: Money,
    /// Round whose price applies at this phase; `None` before any round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_id: Option<RoundId>,
    pub round_name: String,
    pub total_shares: Shares,
    /// Annual profit per outstanding share.
    pub eps: Money,
    pub distribution_rate: Percent,
    pub reinvest_rate: Percent,
    pub cash_per_share: Money,
    pub reinvest_per_share: Money,
    pub current_price: Money,
    /// Price of the first round strictly after this phase. Absent when none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_round_name: Option<String>,
    /// Growth from `current_price` to `projected_price`, in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_pct: Option<Percent>,
}

// ─── Round lookup ────────────────────────────────────────────────────────────

/// Round whose price applies at `month`.
///
/// Exact month match first, then the latest dated round at or before the
/// month, then the chronologically last round. Rounds without a parseable
/// month only take part in the final fallback.
pub fn locate_phase_round(rounds: &[Round], month: Month) -> Option<&Round> {
    if let Some(exact) = rounds.iter().find(|r| r.month() == Some(month)) {
        return Some(exact);
    }

    let mut best: Option<(Month, &Round)> = None;
    for round in rounds {
        if let Some(m) = round.month().filter(|m| *m <= month) {
            if best.map_or(true, |(best_month, _)| m > best_month) {
                best = Some((m, round));
            }
        }
    }

    best.map(|(_, r)| r).or_else(|| rounds.last())
}

/// Earliest dated round strictly after `month`.
///
/// Chooses by month, not by position, so a sequence that was never sorted
/// still reports the nearest later round. Ties go to the first in sequence.
pub fn locate_next_round(rounds: &[Round], month: Month) -> Option<&Round> {
    let mut best: Option<(Month, &Round)> = None;
    for round in rounds {
        if let Some(m) = round.month().filter(|m| *m > month) {
            if best.map_or(true, |(best_month, _)| m < best_month) {
                best = Some((m, round));
            }
        }
    }
    best.map(|(_, r)| r)
}

/// Clamp a distribution rate into 0–100.
pub fn clamp_rate(rate: Percent) -> Percent {
    rate.max(Decimal::ZERO).min(HUNDRED)
}

// ─── Projection ──────────────────────────────────────────────────────────────

/// Project per-share cash and reinvestment at the phase named `phase_key`.
///
/// Read-only over already-computed rounds. Fails only if the phase key is
/// unknown.
pub fn project_phase(
    phase_key: &str,
    phases: &PhaseMap,
    rounds: &[Round],
    capitalization: &Capitalization,
    distribution_rate: Percent,
) -> FundingRoundsResult<PhaseProjection> {
    let phase = phases
        .get(phase_key)
        .ok_or_else(|| FundingRoundsError::PhaseNotFound(phase_key.to_string()))?;

    let phase_round = locate_phase_round(rounds, phase.month);
    let (total_shares, current_price) = match phase_round {
        Some(r) => (r.total_shares, r.stock_price),
        None => (capitalization.shares(), capitalization.initial_price),
    };

    let distribution_rate = clamp_rate(distribution_rate);
    let reinvest_rate = HUNDRED - distribution_rate;

    let eps = if total_shares > Decimal::ZERO {
        safe_div(phase.annual_profit, total_shares)
    } else {
        Decimal::ZERO
    };
    let cash_per_share = percent_of(eps, distribution_rate);
    let reinvest_per_share = percent_of(eps, reinvest_rate);

    let next_round = locate_next_round(rounds, phase.month);
    let projected_price = next_round.map(|r| r.stock_price);
    let growth_pct = projected_price.and_then(|next| percent_change(current_price, next));

    Ok(PhaseProjection {
        phase_key: phase_key.to_string(),
        phase_name: phase.name.clone(),
        target: phase.target.clone(),
        month: phase.month,
        annual_profit: phase.annual_profit,
        round_id: phase_round.map(Round::id),
        round_name: phase_round
            .map(|r| r.name().to_string())
            .unwrap_or_else(|| FOUNDING_LABEL.to_string()),
        total_shares,
        eps,
        distribution_rate,
        reinvest_rate,
        cash_per_share,
        reinvest_per_share,
        current_price,
        projected_price,
        next_round_name: next_round.map(|r| r.name().to_string()),
        growth_pct,
    })
}

/// Run the phase projector and wrap the result in the standard envelope.
pub fn build_phase_projection(
    phase_key: &str,
    phases: &PhaseMap,
    rounds: &[Round],
    capitalization: &Capitalization,
    distribution_rate: Percent,
) -> FundingRoundsResult<ComputationOutput<PhaseProjection>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if distribution_rate != clamp_rate(distribution_rate) {
        warnings.push(format!(
            "Distribution rate {}% clamped to 0–100%",
            distribution_rate
        ));
    }

    let projection = project_phase(phase_key, phases, rounds, capitalization, distribution_rate)?;

    if rounds.iter().all(|r| r.month().is_none()) && !rounds.is_empty() {
        warnings.push("No round carries a parseable month; using the last round".into());
    }
    if projection.annual_profit.is_sign_negative() && !projection.annual_profit.is_zero() {
        warnings.push(format!(
            "{} projects a loss; per-share distributions are negative",
            projection.phase_name
        ));
    }

    let elapsed = elapsed_us(start);
    Ok(with_metadata(
        "Phase Projection (EPS split into cash distribution and reinvestment)",
        &serde_json::json!({
            "phase_key": phase_key,
            "phase_month": projection.month,
            "distribution_rate": projection.distribution_rate.to_string(),
            "num_rounds": rounds.len(),
            "round_lookup": "exact month, else latest at or before, else last round",
        }),
        warnings,
        elapsed,
        projection,
    ))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
