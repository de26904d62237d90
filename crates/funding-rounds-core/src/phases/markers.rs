use serde::{Deserialize, Serialize};

use super::model::PhaseMap;
use crate::rounds::{Round, RoundId};

/// A round that lands exactly on a phase's month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseMarker {
    pub phase_key: String,
    pub round_id: RoundId,
    /// 1-based chronological position of the round.
    pub round_number: usize,
}

/// Pin rounds onto the phase timeline by month.
pub fn phase_markers(phases: &PhaseMap, rounds: &[Round]) -> Vec<PhaseMarker> {
    let mut markers = Vec::new();
    for (index, round) in rounds.iter().enumerate() {
        let Some(month) = round.month() else {
            continue;
        };
        for (key, phase) in phases.iter() {
            if phase.month == month {
                markers.push(PhaseMarker {
                    phase_key: key.to_string(),
                    round_id: round.id(),
                    round_number: index + 1,
                });
            }
        }
    }
    markers
}
