use thiserror::Error;

use crate::rounds::RoundId;

#[derive(Debug, Error)]
pub enum FundingRoundsError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Round not found: {0}")]
    RoundNotFound(RoundId),

    #[error("At least one round must remain in the project")]
    LastRoundDeletion,

    #[error("Phase not found: {0}")]
    PhaseNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for FundingRoundsError {
    fn from(e: serde_json::Error) -> Self {
        FundingRoundsError::SerializationError(e.to_string())
    }
}
