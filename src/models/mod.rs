//! Data models.

pub mod category;
pub mod config;
pub mod report;
pub mod rules;
