//! Semantic file categories.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Semantic classification of a file or directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Movie,
    TvShow,
    Ebook,
    Audio,
    App,
    Android,
    Archive,
    Image,
    Subtitle,
    Document,
    Iso,
    Script,
    Other,
}

impl Category {
    /// All categories, in declaration order.
    pub const ALL: [Category; 13] = [
        Category::Movie,
        Category::TvShow,
        Category::Ebook,
        Category::Audio,
        Category::App,
        Category::Android,
        Category::Archive,
        Category::Image,
        Category::Subtitle,
        Category::Document,
        Category::Iso,
        Category::Script,
        Category::Other,
    ];

    /// Lowercase identifier used in config files and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Movie => "movie",
            Category::TvShow => "tvshow",
            Category::Ebook => "ebook",
            Category::Audio => "audio",
            Category::App => "app",
            Category::Android => "android",
            Category::Archive => "archive",
            Category::Image => "image",
            Category::Subtitle => "subtitle",
            Category::Document => "document",
            Category::Iso => "iso",
            Category::Script => "script",
            Category::Other => "other",
        }
    }

    /// Categories ignored when aggregating a directory's contents.
    pub fn is_noise(&self) -> bool {
        matches!(self, Category::Image | Category::Document | Category::Other)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let lower = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower || (lower == "tv" && *c == Category::TvShow))
            .ok_or_else(|| crate::Error::configuration(format!("unknown category '{}'", s)))
    }
}
