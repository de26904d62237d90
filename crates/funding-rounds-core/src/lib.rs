pub mod coerce;
pub mod error;
pub mod rounds;
pub mod types;

#[cfg(feature = "ownership")]
pub mod ownership;

#[cfg(feature = "phases")]
pub mod phases;

#[cfg(feature = "project")]
pub mod project;

pub use error::FundingRoundsError;
pub use types::*;

/// Standard result type for all funding-round operations
pub type FundingRoundsResult<T> = Result<T, FundingRoundsError>;
