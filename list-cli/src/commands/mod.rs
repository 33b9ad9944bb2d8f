//! CLI command implementations.

pub mod add;
pub mod delete;
pub mod list;
pub mod move_row;
pub mod status;
