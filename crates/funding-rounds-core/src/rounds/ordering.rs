use super::model::RoundInput;
use crate::types::Month;

/// Chronological sort key for each round, in sequence order.
///
/// A round whose timing carries no month inherits the key of the round
/// before it (0 for the first round), so undated rounds keep their place
/// relative to their dated neighbours.
pub fn timing_keys(rounds: &[RoundInput]) -> Vec<Month> {
    let mut carried: Month = 0;
    rounds
        .iter()
        .map(|round| {
            if let Some(month) = round.month() {
                carried = month;
            }
            carried
        })
        .collect()
}

/// Stable sort of the sequence by timing month.
///
/// Returns `true` if the order changed.
pub fn sort_by_timing(rounds: &mut Vec<RoundInput>) -> bool {
    let keys = timing_keys(rounds);
    let mut keyed: Vec<(Month, RoundInput)> = keys.into_iter().zip(rounds.drain(..)).collect();
    let before: Vec<_> = keyed.iter().map(|(_, r)| r.id).collect();

    keyed.sort_by_key(|(key, _)| *key);

    let changed = keyed.iter().map(|(_, r)| r.id).ne(before.iter().copied());
    rounds.extend(keyed.into_iter().map(|(_, r)| r));
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounds::RoundId;
    use rust_decimal::Decimal;

    fn round(id: u64, timing: &str) -> RoundInput {
        RoundInput::new(RoundId(id), format!("R{id}"), Decimal::ONE, Decimal::TEN).with_timing(timing)
    }

    fn ids(rounds: &[RoundInput]) -> Vec<u64> {
        rounds.iter().map(|r| r.id.0).collect()
    }

    #[test]
    fn test_sort_orders_by_month() {
        let mut rounds = vec![round(1, "Month 36"), round(2, "Month 11"), round(3, "Month 12")];
        assert!(sort_by_timing(&mut rounds));
        assert_eq!(ids(&rounds), vec![2, 3, 1]);
    }

    #[test]
    fn test_undated_first_round_stays_first() {
        let mut rounds = vec![round(1, "Founding"), round(5, "Month 36"), round(3, "Month 11")];
        sort_by_timing(&mut rounds);
        assert_eq!(ids(&rounds), vec![1, 3, 5]);
    }

    #[test]
    fn test_undated_round_follows_predecessor() {
        let mut rounds = vec![
            round(1, "Month 20"),
            round(2, ""),
            round(3, "Month 5"),
        ];
        // Round 2 inherits month 20 from round 1, so both move after round 3.
        sort_by_timing(&mut rounds);
        assert_eq!(ids(&rounds), vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_is_stable_and_reports_no_change() {
        let mut rounds = vec![round(4, "Month 12"), round(2, "Month 12"), round(9, "Month 13")];
        assert!(!sort_by_timing(&mut rounds));
        assert_eq!(ids(&rounds), vec![4, 2, 9]);
    }
}
