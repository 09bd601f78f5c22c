//! Validated sorting rules.

use super::category::Category;
use super::config::{ConflictPolicy, SortingConfig};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Category -> destination folder and category -> companion categories.
#[derive(Debug, Clone)]
pub struct SortRules {
    destinations: BTreeMap<Category, String>,
    companions: BTreeMap<Category, BTreeSet<Category>>,
    /// Policy applied when a move destination already exists.
    pub on_conflict: ConflictPolicy,
}

impl SortRules {
    /// Validate raw sorting config.
    pub fn from_config(config: &SortingConfig) -> Result<Self> {
        let mut destinations = BTreeMap::new();
        let mut seen = BTreeSet::new();

        for (category, dir) in &config.destinations {
            let category: Category = category.parse()?;
            let dir = dir.trim();
            if dir.is_empty() || dir == "." || dir == ".." || dir.contains(&['/', '\\'][..]) {
                return Err(Error::configuration(format!(
                    "Invalid destination directory for {}: '{}'",
                    category, dir
                )));
            }
            if !seen.insert(dir.to_string()) {
                return Err(Error::configuration(format!(
                    "Destination directory '{}' is used by more than one category",
                    dir
                )));
            }
            destinations.insert(category, dir.to_string());
        }

        let mut companions = BTreeMap::new();
        for (category, list) in &config.companions {
            let category: Category = category.parse()?;
            let list = list
                .iter()
                .map(|c| c.parse::<Category>())
                .collect::<Result<BTreeSet<_>>>()?;
            companions.insert(category, list);
        }

        Ok(Self {
            destinations,
            companions,
            on_conflict: config.on_conflict,
        })
    }

    /// Destination folder name of a category.
    pub fn destination(&self, category: Category) -> Option<&str> {
        self.destinations.get(&category).map(String::as_str)
    }

    /// Whether a directory name is one of the destination folders.
    pub fn is_sorted_dir(&self, name: &str) -> bool {
        self.destinations.values().any(|d| d == name)
    }

    /// Whether a category may be sorted at all.
    pub fn is_allowed(&self, category: Category) -> bool {
        self.companions.contains_key(&category)
    }

    /// Categories that travel with a category.
    pub fn companions(&self, category: Category) -> impl Iterator<Item = Category> + '_ {
        self.companions
            .get(&category)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Whether `other` may travel with `category`.
    pub fn is_companion(&self, category: Category, other: Category) -> bool {
        self.companions
            .get(&category)
            .map(|set| set.contains(&other))
            .unwrap_or(false)
    }

    /// All configured destination folders.
    pub fn destinations(&self) -> impl Iterator<Item = (Category, &str)> {
        self.destinations.iter().map(|(c, d)| (*c, d.as_str()))
    }
}

impl Default for SortRules {
    fn default() -> Self {
        let config = SortingConfig::default();
        let destinations: BTreeMap<Category, String> = config
            .destinations
            .iter()
            .filter_map(|(c, d)| Some((c.parse().ok()?, d.clone())))
            .collect();
        let companions: BTreeMap<Category, BTreeSet<Category>> = config
            .companions
            .iter()
            .filter_map(|(c, list)| {
                let set = list.iter().filter_map(|x| x.parse().ok()).collect();
                Some((c.parse().ok()?, set))
            })
            .collect();
        Self {
            destinations,
            companions,
            on_conflict: config.on_conflict,
        }
    }
}
