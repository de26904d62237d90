use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::coerce::safe_div;
use crate::rounds::{Capitalization, Round, RoundId};
use crate::types::{elapsed_us, with_metadata, ComputationOutput, Money, Percent, Shares};

const HUNDRED: Decimal = dec!(100);

/// Tolerance for the percentage reconciliation check.
const PCT_TOLERANCE: Decimal = dec!(0.000001);

/// Absolute floor for the value reconciliation check; large valuations get
/// a relative allowance of one part in 10^12 on top.
const VALUE_TOLERANCE: Decimal = dec!(0.000001);

// ─── Structs ─────────────────────────────────────────────────────────────────

/// Which cohort a cap-table row describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Holder {
    Founders,
    Investors { round_id: RoundId },
    Total,
}

/// A single row of the exit cap table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnershipRow {
    pub label: String,
    pub holder: Holder,
    pub paid_in: Money,
    pub shares: Shares,
    /// Percentage of the final share count, 0–100.
    pub percentage: Percent,
    /// Value at the final round's post-money valuation.
    pub value: Money,
    pub profit: Money,
}

/// Cap table at the chronologically last round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnershipTable {
    pub final_valuation: Money,
    pub final_shares: Shares,
    /// Founders first, then one row per round in order, then the totals row.
    pub rows: Vec<OwnershipRow>,
}

impl OwnershipTable {
    pub fn founders(&self) -> Option<&OwnershipRow> {
        self.rows.iter().find(|r| r.holder == Holder::Founders)
    }

    pub fn investors(&self) -> impl Iterator<Item = &OwnershipRow> {
        self.rows
            .iter()
            .filter(|r| matches!(r.holder, Holder::Investors { .. }))
    }

    pub fn totals(&self) -> Option<&OwnershipRow> {
        self.rows.iter().find(|r| r.holder == Holder::Total)
    }
}

// ─── Allocation ──────────────────────────────────────────────────────────────

fn holder_row(
    label: String,
    holder: Holder,
    paid_in: Money,
    shares: Shares,
    final_shares: Shares,
    final_valuation: Money,
) -> OwnershipRow {
    let percentage = safe_div(shares, final_shares) * HUNDRED;
    let value = percentage / HUNDRED * final_valuation;
    OwnershipRow {
        label,
        holder,
        paid_in,
        shares,
        percentage,
        value,
        profit: value - paid_in,
    }
}

/// Sum of one column; saturates at `Decimal::MAX` instead of overflowing.
fn column_total(rows: &[OwnershipRow], column: impl Fn(&OwnershipRow) -> Decimal) -> Decimal {
    rows.iter().fold(Decimal::ZERO, |acc, row| {
        acc.checked_add(column(row)).unwrap_or(Decimal::MAX)
    })
}

/// Build the cap table valued at the last round in `rounds`.
///
/// With no rounds the founders hold everything at the initial valuation.
/// A non-positive final share count yields zero percentages rather than a
/// division error.
pub fn allocate_ownership(capitalization: &Capitalization, rounds: &[Round]) -> OwnershipTable {
    let (final_valuation, final_shares) = match rounds.last() {
        Some(last) => (last.post_valuation, last.total_shares),
        None => (capitalization.initial_valuation(), capitalization.shares()),
    };

    let mut rows = Vec::with_capacity(rounds.len() + 2);
    rows.push(holder_row(
        "Founders".into(),
        Holder::Founders,
        capitalization.initial_valuation(),
        capitalization.shares(),
        final_shares,
        final_valuation,
    ));

    for round in rounds {
        rows.push(holder_row(
            round.name().to_string(),
            Holder::Investors {
                round_id: round.id(),
            },
            round.input.funding_amount,
            round.round_shares,
            final_shares,
            final_valuation,
        ));
    }

    let total_paid: Money = column_total(&rows, |r| r.paid_in);
    let total_shares: Shares = column_total(&rows, |r| r.shares);
    let total_pct: Percent = column_total(&rows, |r| r.percentage);
    let total_value: Money = column_total(&rows, |r| r.value);
    let total_profit: Money = column_total(&rows, |r| r.profit);

    rows.push(OwnershipRow {
        label: "Total".into(),
        holder: Holder::Total,
        paid_in: total_paid,
        shares: total_shares,
        percentage: total_pct,
        value: total_value,
        profit: total_profit,
    });

    OwnershipTable {
        final_valuation,
        final_shares,
        rows,
    }
}

fn reconciliation_warnings(table: &OwnershipTable) -> Vec<String> {
    let mut warnings = Vec::new();
    let Some(totals) = table.totals() else {
        return warnings;
    };

    if table.final_shares <= Decimal::ZERO {
        warnings.push("Final share count is not positive; percentages reported as zero".into());
        return warnings;
    }
    if totals.shares != table.final_shares {
        warnings.push(format!(
            "Cap table shares ({}) do not match final share count ({})",
            totals.shares, table.final_shares
        ));
    }
    if (totals.percentage - HUNDRED).abs() > PCT_TOLERANCE {
        warnings.push(format!(
            "Ownership percentages sum to {}%, expected 100%",
            totals.percentage.round_dp(6)
        ));
    }
    let tolerance = VALUE_TOLERANCE.max(table.final_valuation.abs() * dec!(0.000000000001));
    let reconciled = totals.paid_in.saturating_add(totals.profit);
    if reconciled.saturating_sub(table.final_valuation).abs() > tolerance {
        warnings.push(format!(
            "Paid-in plus profit ({}) does not reconcile to the final valuation ({})",
            reconciled.round_dp(6),
            table.final_valuation
        ));
    }
    for row in table.rows.iter().filter(|r| r.profit.is_sign_negative()) {
        if row.holder != Holder::Total && !row.profit.is_zero() {
            warnings.push(format!("{} is under water at the final valuation", row.label));
        }
    }
    warnings
}

/// Run the ownership allocator and wrap the table in the standard envelope.
pub fn build_ownership_table(
    capitalization: &Capitalization,
    rounds: &[Round],
) -> ComputationOutput<OwnershipTable> {
    let start = Instant::now();

    let table = allocate_ownership(capitalization, rounds);
    let warnings = reconciliation_warnings(&table);

    let elapsed = elapsed_us(start);
    with_metadata(
        "Exit Cap Table at Final Post-Money Valuation",
        &serde_json::json!({
            "initial_shares": capitalization.initial_shares,
            "initial_price": capitalization.initial_price.to_string(),
            "num_rounds": rounds.len(),
            "valuation_basis": "post-money valuation of the chronologically last round",
        }),
        warnings,
        elapsed,
        table,
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
