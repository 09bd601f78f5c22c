//! CLI command implementations.

pub mod clean;
pub mod info;
pub mod layout;
pub mod sort;
