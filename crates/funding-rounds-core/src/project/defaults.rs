use rust_decimal_macros::dec;

use super::state::ProjectState;
use crate::phases::{PhaseMap, DEFAULT_DISTRIBUTION_RATE, DEFAULT_PHASE_KEY};
use crate::rounds::{Capitalization, RoundId, RoundInput};

pub const DEFAULT_PROJECT_TITLE: &str = "Bank ownership structure";

/// Project used when nothing usable has been saved yet.
///
/// Round 2 was removed from the plan, so ids run 1, 3, 4, 5.
pub fn default_project() -> ProjectState {
    let rounds = vec![
        RoundInput::new(RoundId(1), "Pre-seed founding", dec!(60000), dec!(5))
            .with_timing("Founding")
            .with_notes("Before opening"),
        RoundInput::new(RoundId(3), "Series B break-even", dec!(400000), dec!(12))
            .with_timing("Month 11")
            .with_notes("Break-even point"),
        RoundInput::new(RoundId(4), "Series C", dec!(5000000), dec!(10)).with_timing("Month 12"),
        RoundInput::new(RoundId(5), "International expansion", dec!(20000000), dec!(15))
            .with_timing("Month 36"),
    ];

    ProjectState::from_parts(
        DEFAULT_PROJECT_TITLE,
        Capitalization::default(),
        rounds,
        5,
        PhaseMap::defaults(),
        DEFAULT_PHASE_KEY,
        DEFAULT_DISTRIBUTION_RATE,
    )
}
