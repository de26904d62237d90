pub mod cap_table;

pub use cap_table::{allocate_ownership, build_ownership_table, Holder, OwnershipRow, OwnershipTable};
