pub mod investor;
pub mod markers;
pub mod model;
pub mod projector;

pub use investor::{investor_summary, InvestorSummary, TimelinePrice};
pub use markers::{phase_markers, PhaseMarker};
pub use model::{Phase, PhaseMap, DEFAULT_PHASE_KEY, DEFAULT_PHASE_MONTH};
pub use projector::{
    build_phase_projection, clamp_rate, locate_next_round, locate_phase_round, project_phase,
    PhaseProjection, DEFAULT_DISTRIBUTION_RATE,
};
