use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce;
use crate::error::FundingRoundsError;
use crate::types::{Money, Month, Multiple, Percent, Shares};
use crate::FundingRoundsResult;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Stable identifier of a round. Independent of the round's position in the
/// sequence and never reused within a project. `0` means "not yet assigned".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl RoundId {
    pub const UNASSIGNED: RoundId = RoundId(0);

    pub fn is_assigned(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

const DEFAULT_ROUND_NAMES: [&str; 7] = [
    "Founding", "Series A", "Series B", "Series C", "Series D", "Series E", "IPO",
];

/// Name given to a freshly added round, picked by its id.
pub fn default_round_name(id: RoundId) -> String {
    id.0.checked_sub(1)
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| DEFAULT_ROUND_NAMES.get(i))
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Round {}", id.0))
}

// ─── Capitalization ──────────────────────────────────────────────────────────

/// Founders' position before any round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capitalization {
    /// Shares held by founders before any round. Always > 0.
    pub initial_shares: u64,
    /// Founders' nominal price per share.
    pub initial_price: Money,
}

impl Capitalization {
    pub const DEFAULT_SHARES: u64 = 1_000_000;
    pub const DEFAULT_PRICE: Money = dec!(0.05);

    /// Strict constructor used for interactive edits.
    pub fn new(initial_shares: u64, initial_price: Money) -> FundingRoundsResult<Self> {
        if initial_shares == 0 {
            return Err(FundingRoundsError::InvalidInput {
                field: "initial_shares".into(),
                reason: "Initial shares must be greater than zero".into(),
            });
        }
        if initial_price <= Decimal::ZERO {
            return Err(FundingRoundsError::InvalidInput {
                field: "initial_price".into(),
                reason: "Initial price must be positive".into(),
            });
        }
        Ok(Self {
            initial_shares,
            initial_price,
        })
    }

    /// Lenient constructor for persisted or form data: bad values fall back
    /// to the defaults.
    pub fn from_values(shares: Option<&Value>, price: Option<&Value>) -> Self {
        Self {
            initial_shares: coerce::positive_u64_or(shares, Self::DEFAULT_SHARES),
            initial_price: coerce::positive_or(price, Self::DEFAULT_PRICE),
        }
    }

    pub fn shares(&self) -> Shares {
        Decimal::from(self.initial_shares)
    }

    /// Founders' paid-in value, `initial_shares × initial_price`.
    pub fn initial_valuation(&self) -> Money {
        self.shares()
            .checked_mul(self.initial_price)
            .unwrap_or(Decimal::ZERO)
    }
}

impl Default for Capitalization {
    fn default() -> Self {
        Self {
            initial_shares: Self::DEFAULT_SHARES,
            initial_price: Self::DEFAULT_PRICE,
        }
    }
}

// ─── Rounds ──────────────────────────────────────────────────────────────────

/// The editable fields of one funding round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInput {
    pub id: RoundId,
    pub name: String,
    /// Cash raised in the round.
    pub funding_amount: Money,
    /// Share of the post-round company sold to the new investors, 0–100.
    pub sold_percentage: Percent,
    /// Free text whose first integer is the round's month, e.g. "Month 12".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RoundInput {
    pub fn new(
        id: RoundId,
        name: impl Into<String>,
        funding_amount: Money,
        sold_percentage: Percent,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            funding_amount,
            sold_percentage,
            timing: None,
            notes: None,
        }
    }

    pub fn with_timing(mut self, timing: impl Into<String>) -> Self {
        let timing = timing.into();
        self.timing = if timing.trim().is_empty() {
            None
        } else {
            Some(timing)
        };
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.notes = if notes.trim().is_empty() {
            None
        } else {
            Some(notes)
        };
        self
    }

    /// Build a round from loosely-typed JSON (either naming convention).
    ///
    /// Missing or malformed numbers coerce to zero; a missing id stays
    /// [`RoundId::UNASSIGNED`] and a missing name stays empty so the caller
    /// can repair both once ids are known.
    pub fn from_value(value: &Value) -> Self {
        let field = |camel: &str, snake: &str| value.get(camel).or_else(|| value.get(snake));

        let id = RoundId(coerce::positive_u64_or(value.get("id"), 0));
        let name = coerce::text_or_none(value.get("name")).unwrap_or_default();

        Self {
            id,
            name,
            funding_amount: coerce::non_negative_or(
                field("fundingAmount", "funding_amount"),
                Decimal::ZERO,
            ),
            sold_percentage: coerce::non_negative_or(
                field("soldPercentage", "sold_percentage"),
                Decimal::ZERO,
            ),
            timing: coerce::text_or_none(value.get("timing")),
            notes: coerce::text_or_none(value.get("notes")),
        }
    }

    /// Month parsed from `timing`, if any.
    pub fn month(&self) -> Option<Month> {
        self.timing.as_deref().and_then(coerce::parse_timing_month)
    }
}

/// A round together with every field derived by the dilution engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    #[serde(flatten)]
    pub input: RoundInput,
    pub pre_valuation: Money,
    pub post_valuation: Money,
    /// Shares outstanding after the round.
    pub total_shares: Shares,
    /// Shares newly issued to this round's investors.
    pub round_shares: Shares,
    pub stock_price: Money,
    /// Stock price relative to the immediately preceding price.
    pub profit_multiplier: Multiple,
}

impl Round {
    /// A freshly created round: editable fields populated, derived fields zeroed.
    pub fn pending(input: RoundInput) -> Self {
        Self {
            input,
            pre_valuation: Decimal::ZERO,
            post_valuation: Decimal::ZERO,
            total_shares: Decimal::ZERO,
            round_shares: Decimal::ZERO,
            stock_price: Decimal::ZERO,
            profit_multiplier: Decimal::ZERO,
        }
    }

    pub fn id(&self) -> RoundId {
        self.input.id
    }

    pub fn name(&self) -> &str {
        &self.input.name
    }

    pub fn month(&self) -> Option<Month> {
        self.input.month()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_round_names() {
        assert_eq!(default_round_name(RoundId(1)), "Founding");
        assert_eq!(default_round_name(RoundId(2)), "Series A");
        assert_eq!(default_round_name(RoundId(7)), "IPO");
        assert_eq!(default_round_name(RoundId(8)), "Round 8");
        assert_eq!(default_round_name(RoundId(0)), "Round 0");
    }

    #[test]
    fn test_capitalization_strict_rejects_zero_shares() {
        let err = Capitalization::new(0, dec!(0.05)).unwrap_err();
        assert!(matches!(err, FundingRoundsError::InvalidInput { .. }));
        assert!(Capitalization::new(10, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_capitalization_lenient_defaults() {
        let cap = Capitalization::from_values(Some(&json!("abc")), Some(&json!(0)));
        assert_eq!(cap, Capitalization::default());
        assert_eq!(cap.initial_valuation(), dec!(50000));
    }

    #[test]
    fn test_round_from_camel_case_value() {
        let v = json!({
            "id": 3,
            "name": "Series B",
            "fundingAmount": 400000,
            "soldPercentage": "12",
            "timing": "Month 11",
            "notes": ""
        });
        let round = RoundInput::from_value(&v);
        assert_eq!(round.id, RoundId(3));
        assert_eq!(round.funding_amount, dec!(400000));
        assert_eq!(round.sold_percentage, dec!(12));
        assert_eq!(round.month(), Some(11));
        assert_eq!(round.notes, None);
    }

    #[test]
    fn test_round_from_garbage_value_coerces_to_zero() {
        let v = json!({ "fundingAmount": "lots", "soldPercentage": null });
        let round = RoundInput::from_value(&v);
        assert_eq!(round.id, RoundId::UNASSIGNED);
        assert_eq!(round.name, "");
        assert_eq!(round.funding_amount, Decimal::ZERO);
        assert_eq!(round.sold_percentage, Decimal::ZERO);
        assert_eq!(round.month(), None);
    }

    #[test]
    fn test_round_from_snake_case_value() {
        let v = json!({ "id": 2, "name": "A", "funding_amount": "1000", "sold_percentage": 10 });
        let round = RoundInput::from_value(&v);
        assert_eq!(round.funding_amount, dec!(1000));
        assert_eq!(round.sold_percentage, dec!(10));
    }

    #[test]
    fn test_negative_inputs_coerce_to_zero() {
        let v = json!({ "id": 1, "fundingAmount": -5, "soldPercentage": -10 });
        let round = RoundInput::from_value(&v);
        assert_eq!(round.funding_amount, Decimal::ZERO);
        assert_eq!(round.sold_percentage, Decimal::ZERO);
    }
}
