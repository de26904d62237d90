pub mod analysis;
pub mod project;
