pub mod defaults;
pub mod history;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod store;

pub use defaults::default_project;
pub use history::{History, RoundSequence, DEFAULT_HISTORY_LIMIT};
pub use session::ProjectSession;
pub use snapshot::{ProjectSnapshot, DEFAULT_PROJECT_NAME};
pub use state::{PhasePatch, ProjectState, ProjectView, RoundPatch};
pub use store::{JsonFileStore, MemoryStore, ProjectStore};
