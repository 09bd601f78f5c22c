//! File Sorter Library
//!
//! A library for classifying files and directories by name and extension,
//! cleaning release-style names, and sorting entries into category folders.

pub mod cli;
pub mod core;
pub mod error;
pub mod models;
pub mod utils;

pub use error::{Error, Result};
