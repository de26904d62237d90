use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::model::PhaseMap;
use crate::coerce::percent_change;
use crate::rounds::{Round, RoundId};
use crate::types::{Money, Percent};

/// Number of rounds shown on the investor timeline.
const TIMELINE_LEN: usize = 4;

/// A round's price as shown on the investor timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimelinePrice {
    pub round_id: RoundId,
    pub round_name: String,
    pub stock_price: Money,
}

/// Headline numbers for prospective investors: entry price, exit price and
/// the profit of the final growth phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvestorSummary {
    pub start_round: RoundId,
    pub start_price: Money,
    /// Round with the highest post-money valuation.
    pub exit_round: RoundId,
    pub exit_price: Money,
    pub exit_valuation: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_growth_pct: Option<Percent>,
    /// Annual profit of the final phase on the timeline.
    pub annual_profit: Money,
    pub timeline_prices: Vec<TimelinePrice>,
}

/// Summarise the round sequence for the investor view. `None` without rounds.
pub fn investor_summary(rounds: &[Round], phases: &PhaseMap) -> Option<InvestorSummary> {
    let start = rounds.first()?;
    let exit = rounds.iter().fold(start, |best, r| {
        if r.post_valuation > best.post_valuation {
            r
        } else {
            best
        }
    });

    Some(InvestorSummary {
        start_round: start.id(),
        start_price: start.stock_price,
        exit_round: exit.id(),
        exit_price: exit.stock_price,
        exit_valuation: exit.post_valuation,
        price_growth_pct: percent_change(start.stock_price, exit.stock_price),
        annual_profit: phases
            .last()
            .map(|(_, p)| p.annual_profit)
            .unwrap_or(Decimal::ZERO),
        timeline_prices: rounds
            .iter()
            .take(TIMELINE_LEN)
            .map(|r| TimelinePrice {
                round_id: r.id(),
                round_name: r.name().to_string(),
                stock_price: r.stock_price,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounds::{compute_rounds, Capitalization, RoundInput};
    use rust_decimal_macros::dec;

    fn round(id: u64, funding: Decimal, sold: Decimal) -> RoundInput {
        RoundInput::new(RoundId(id), format!("R{id}"), funding, sold)
    }

    #[test]
    fn test_empty_sequence_has_no_summary() {
        assert!(investor_summary(&[], &PhaseMap::defaults()).is_none());
    }

    #[test]
    fn test_exit_is_highest_post_money() {
        let rounds = compute_rounds(
            &Capitalization::default(),
            &[
                round(1, dec!(60000), dec!(5)),
                round(2, dec!(5000000), dec!(10)),
                round(3, dec!(100000), dec!(10)),
            ],
        );
        let s = investor_summary(&rounds, &PhaseMap::defaults()).unwrap();
        assert_eq!(s.start_round, RoundId(1));
        assert_eq!(s.exit_round, RoundId(2));
        assert_eq!(s.exit_valuation, dec!(50000000));
        assert_eq!(s.annual_profit, dec!(4498647));
        assert!(s.price_growth_pct.unwrap() > Decimal::ZERO);
    }

    #[test]
    fn test_timeline_limited_to_four() {
        let inputs: Vec<RoundInput> = (1..=6).map(|i| round(i, dec!(1000), dec!(5))).collect();
        let rounds = compute_rounds(&Capitalization::default(), &inputs);
        let s = investor_summary(&rounds, &PhaseMap::new()).unwrap();
        assert_eq!(s.timeline_prices.len(), 4);
        assert_eq!(s.annual_profit, Decimal::ZERO);
    }

    #[test]
    fn test_zero_start_price_omits_growth() {
        let rounds = compute_rounds(
            &Capitalization::default(),
            &[round(1, dec!(1000), Decimal::ZERO), round(2, dec!(1000), dec!(10))],
        );
        let s = investor_summary(&rounds, &PhaseMap::new()).unwrap();
        assert!(s.price_growth_pct.is_none());
    }
}
