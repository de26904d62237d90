pub mod dilution;
pub mod model;
pub mod ordering;

pub use dilution::{compute_rounds, recalculate, DilutionInput, DilutionOutput};
pub use model::{default_round_name, Capitalization, Round, RoundId, RoundInput};
