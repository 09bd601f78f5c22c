//! Configuration model.

use super::category::Category;
use crate::core::{classifier, cleaner};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sorting configuration.
    pub sorting: SortingConfig,
    /// Name cleaning configuration.
    pub cleaning: CleaningConfig,
    /// Extension rules, first match wins.
    pub extensions: Vec<ExtensionRule>,
}

/// Sorting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SortingConfig {
    /// What to do when a destination already exists.
    pub on_conflict: ConflictPolicy,
    /// Category name -> destination directory name.
    pub destinations: BTreeMap<String, String>,
    /// Category name -> categories that may travel with it.
    /// The key set is the set of categories allowed to be sorted.
    pub companions: BTreeMap<String, Vec<String>>,
}

/// Name cleaning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Substrings replaced with a space.
    pub noise_chars: Vec<String>,
    /// Whole words removed from names.
    pub noise_words: Vec<String>,
}

/// Maps a list of extensions to a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionRule {
    /// Category name.
    pub category: String,
    /// Extensions without the leading dot.
    pub extensions: Vec<String>,
}

/// Collision policy when a move destination already exists.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Let the rename replace the existing entry.
    #[default]
    Overwrite,
    /// Leave the source where it is.
    Skip,
    /// Append ` (1)`, ` (2)`, ... to the destination name.
    #[serde(rename = "rename")]
    #[value(name = "rename")]
    RenameWithSuffix,
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictPolicy::Overwrite => write!(f, "overwrite"),
            ConflictPolicy::Skip => write!(f, "skip"),
            ConflictPolicy::RenameWithSuffix => write!(f, "rename"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sorting: SortingConfig::default(),
            cleaning: CleaningConfig::default(),
            extensions: classifier::DEFAULT_EXTENSION_RULES
                .iter()
                .map(|(category, exts)| ExtensionRule {
                    category: category.to_string(),
                    extensions: exts.iter().map(|e| e.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl Default for SortingConfig {
    fn default() -> Self {
        let destinations = [
            (Category::Movie, "001-MOVIES"),
            (Category::TvShow, "002-TVSHOWS"),
            (Category::Ebook, "003-EBOOKS"),
            (Category::Audio, "004-AUDIO"),
            (Category::App, "005-APPS"),
            (Category::Android, "006-ANDROID"),
            (Category::Script, "099-SCRIPTS"),
        ]
        .into_iter()
        .map(|(c, d)| (c.to_string(), d.to_string()))
        .collect();

        let companions = [
            (Category::Movie, vec![Category::Subtitle]),
            (Category::TvShow, vec![Category::Movie, Category::Subtitle]),
            (Category::Ebook, vec![]),
            (Category::Audio, vec![]),
            (Category::App, vec![]),
            (Category::Image, vec![]),
            (Category::Iso, vec![]),
            (Category::Android, vec![]),
            (Category::Script, vec![]),
        ]
        .into_iter()
        .map(|(c, list)| {
            (
                c.to_string(),
                list.into_iter().map(|x| x.to_string()).collect(),
            )
        })
        .collect();

        Self {
            destinations,
            companions,
            on_conflict: ConflictPolicy::default(),
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            noise_chars: cleaner::DEFAULT_NOISE_CHARS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            noise_words: cleaner::DEFAULT_NOISE_WORDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Environment variables overriding destination directory names.
const DESTINATION_ENV_VARS: &[(Category, &str)] = &[
    (Category::Movie, "SORTER_MOVIE_DIR"),
    (Category::TvShow, "SORTER_TVSHOW_DIR"),
    (Category::Ebook, "SORTER_EBOOK_DIR"),
    (Category::Audio, "SORTER_AUDIO_DIR"),
    (Category::App, "SORTER_APP_DIR"),
    (Category::Android, "SORTER_ANDROID_DIR"),
    (Category::Image, "SORTER_IMAGE_DIR"),
    (Category::Iso, "SORTER_ISO_DIR"),
    (Category::Script, "SORTER_SCRIPT_DIR"),
];

/// Newline-separated noise word list.
const CLEAN_WORDS_FILE_ENV: &str = "SORTER_CLEAN_WORDS_FILE";
/// Newline-separated noise character list.
const CLEAN_CHARS_FILE_ENV: &str = "SORTER_CLEAN_CHARS_FILE";

impl Config {
    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (category, var) in DESTINATION_ENV_VARS {
            if let Some(dir) = lookup(var).filter(|v| !v.trim().is_empty()) {
                tracing::debug!("{} overrides {} destination: {}", var, category, dir);
                self.sorting
                    .destinations
                    .insert(category.to_string(), dir.trim().to_string());
            }
        }

        if let Some(path) = lookup(CLEAN_WORDS_FILE_ENV) {
            self.cleaning.noise_words = read_word_list(Path::new(&path))?;
        }
        if let Some(path) = lookup(CLEAN_CHARS_FILE_ENV) {
            self.cleaning.noise_chars = read_word_list(Path::new(&path))?;
        }

        Ok(())
    }
}

/// Read a newline-separated list, skipping blank lines.
fn read_word_list(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(crate::Error::PathNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.to_string())
        .collect())
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("file_sorter")
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Parse a config from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

/// Load configuration.
///
/// An explicit `path` must exist and parse. Otherwise the default config
/// file is used when present, falling back to built-in defaults. Environment
/// overrides are applied last.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(p) => {
            if !p.exists() {
                return Err(crate::Error::PathNotFound(p.display().to_string()));
            }
            parse_config(&std::fs::read_to_string(p)?)?
        }
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                match std::fs::read_to_string(&default_path)
                    .map_err(crate::Error::from)
                    .and_then(|c| parse_config(&c))
                {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!(
                            "Ignoring unreadable config {}: {}",
                            default_path.display(),
                            e
                        );
                        Config::default()
                    }
                }
            } else {
                Config::default()
            }
        }
    };

    config.apply_env_overrides()?;
    Ok(config)
}
