//! Core business logic modules.

pub mod classifier;
pub mod cleaner;
pub mod context;
pub mod node;
pub mod sorter;
