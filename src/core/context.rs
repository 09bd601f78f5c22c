//! Shared naming and classification context for nodes.

use super::classifier::{ExtensionTable, TypeClassifier};
use super::cleaner::NameCleaner;
use crate::models::category::Category;
use crate::models::config::Config;
use crate::Result;
use std::sync::Arc;

/// The cleaner and classifier every node derives its metadata from.
///
/// Built once from configuration and shared by all nodes of a pass, so tests
/// can swap in alternate vocabularies and extension tables.
#[derive(Debug, Clone)]
pub struct NodeContext {
    pub cleaner: NameCleaner,
    pub classifier: TypeClassifier,
}

impl NodeContext {
    pub fn new(cleaner: NameCleaner, classifier: TypeClassifier) -> Arc<Self> {
        Arc::new(Self {
            cleaner,
            classifier,
        })
    }

    /// Context with the built-in vocabularies and extension table.
    pub fn with_defaults() -> Result<Arc<Self>> {
        Ok(Self::new(
            NameCleaner::with_defaults()?,
            TypeClassifier::with_defaults()?,
        ))
    }

    /// Context described by a config.
    pub fn from_config(config: &Config) -> Result<Arc<Self>> {
        let table = ExtensionTable::from_rules(&config.extensions)?;
        Ok(Self::new(
            NameCleaner::from_config(&config.cleaning)?,
            TypeClassifier::new(table)?,
        ))
    }

    /// Classify a raw file name such as `Show.S01E02.mkv`.
    pub fn classify_name(&self, file_name: &str) -> Category {
        let (stem, ext) = split_file_name(file_name);
        self.classifier.classify(ext.unwrap_or(""), stem)
    }
}

/// Split a file name into stem and extension the way `Path` does.
pub fn split_file_name(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, None),
        Some(idx) => (&file_name[..idx], Some(&file_name[idx + 1..])),
    }
}
