use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::model::{Capitalization, Round, RoundInput};
use crate::coerce::{round_shares, safe_div};
use crate::types::{elapsed_us, with_metadata, ComputationOutput, Money, Shares};

const HUNDRED: Decimal = dec!(100);

// ─── Structs ─────────────────────────────────────────────────────────────────

/// Input for a full sequential recalculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DilutionInput {
    pub capitalization: Capitalization,
    /// Rounds in chronological order.
    pub rounds: Vec<RoundInput>,
}

/// Output of a full sequential recalculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DilutionOutput {
    pub rounds: Vec<Round>,
    /// Shares outstanding after the last round (initial shares if none).
    pub final_total_shares: Shares,
    /// Post-money valuation of the last round (initial valuation if none).
    pub final_post_valuation: Money,
    /// Stock price after the last round (initial price if none).
    pub final_stock_price: Money,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Compute one round from the share count and price carried forward from
/// the round before it.
fn compute_round(input: &RoundInput, prev_shares: Shares, prev_price: Money) -> Round {
    let sold = input.sold_percentage;
    let sold_fraction = sold / HUNDRED;

    let post_valuation = if sold > Decimal::ZERO {
        safe_div(input.funding_amount, sold_fraction)
    } else {
        Decimal::ZERO
    };
    let pre_valuation = post_valuation - input.funding_amount;

    // A 100% (or larger) sale leaves the share count untouched.
    let total_shares = if sold < HUNDRED {
        round_shares(safe_div(prev_shares, Decimal::ONE - sold_fraction))
    } else {
        prev_shares
    };
    let round_shares = total_shares - prev_shares;

    let stock_price = if total_shares > Decimal::ZERO {
        safe_div(post_valuation, total_shares)
    } else {
        Decimal::ZERO
    };
    let profit_multiplier = if prev_price > Decimal::ZERO {
        safe_div(stock_price, prev_price)
    } else {
        Decimal::ZERO
    };

    Round {
        input: input.clone(),
        pre_valuation,
        post_valuation,
        total_shares,
        round_shares,
        stock_price,
        profit_multiplier,
    }
}

/// Recompute every derived field of every round in one forward pass.
///
/// `rounds` must already be in chronological order. Share counts are rounded
/// at each step and the rounding is carried forward, never corrected. The
/// function is total: degenerate inputs produce zeros, not errors.
pub fn compute_rounds(capitalization: &Capitalization, rounds: &[RoundInput]) -> Vec<Round> {
    let mut prev_shares = capitalization.shares();
    let mut prev_price = capitalization.initial_price;

    rounds
        .iter()
        .map(|input| {
            let round = compute_round(input, prev_shares, prev_price);
            prev_shares = round.total_shares;
            prev_price = round.stock_price;
            round
        })
        .collect()
}

fn round_warnings(rounds: &[Round]) -> Vec<String> {
    let mut warnings = Vec::new();
    for round in rounds {
        let sold = round.input.sold_percentage;
        if sold.is_zero() {
            warnings.push(format!(
                "{} ({}): sold percentage is 0; valuation is zero and no shares are issued",
                round.name(),
                round.id()
            ));
        } else if sold >= HUNDRED {
            warnings.push(format!(
                "{} ({}): sold percentage {}% leaves the share count unchanged",
                round.name(),
                round.id(),
                sold
            ));
        }
        if round.round_shares.is_sign_negative() && !round.round_shares.is_zero() {
            warnings.push(format!(
                "{} ({}): share count decreased by {}",
                round.name(),
                round.id(),
                round.round_shares.abs()
            ));
        }
    }
    warnings
}

/// Run the dilution engine and wrap the result in the standard envelope.
pub fn recalculate(input: &DilutionInput) -> ComputationOutput<DilutionOutput> {
    let start = Instant::now();

    let rounds = compute_rounds(&input.capitalization, &input.rounds);
    let warnings = round_warnings(&rounds);

    let (final_total_shares, final_post_valuation, final_stock_price) = match rounds.last() {
        Some(last) => (last.total_shares, last.post_valuation, last.stock_price),
        None => (
            input.capitalization.shares(),
            input.capitalization.initial_valuation(),
            input.capitalization.initial_price,
        ),
    };

    tracing::debug!(rounds = rounds.len(), %final_total_shares, "recalculated round sequence");

    let output = DilutionOutput {
        rounds,
        final_total_shares,
        final_post_valuation,
        final_stock_price,
    };

    let elapsed = elapsed_us(start);
    with_metadata(
        "Sequential Funding-Round Dilution (post-money from sold percentage)",
        &serde_json::json!({
            "initial_shares": input.capitalization.initial_shares,
            "initial_price": input.capitalization.initial_price.to_string(),
            "num_rounds": input.rounds.len(),
            "share_rounding": "nearest whole share per round, carried forward",
        }),
        warnings,
        elapsed,
        output,
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
