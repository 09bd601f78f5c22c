//! Extension and filename based type classification.

use crate::models::category::Category;
use crate::models::config::ExtensionRule;
use crate::Result;
use regex::Regex;
use std::collections::HashMap;

/// Built-in extension rules, in lookup priority order.
pub const DEFAULT_EXTENSION_RULES: &[(Category, &[&str])] = &[
    (
        Category::Movie,
        &[
            // Common formats
            "avi", "mkv", "mp4", "mpg", "mpeg", "mov", "wmv", "flv", "webm", "m4v",
            // Additional formats
            "3gp", "3g2", "asf", "rm", "swf", "vob", "ts", "m2ts", "mts", "m2t", "m4p", "f4v",
            "ogv", "ogm", "ogx", "divx", "xvid", "rmvb",
        ],
    ),
    (
        Category::Audio,
        &[
            "mp3", "wav", "flac", "ogg", "oga", "opus", "spx", "m4a", "m4b", "m4r", "wma", "aac",
            "ac3", "dts", "pcm", "mka", "weba", "ra",
        ],
    ),
    (Category::Archive, &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"]),
    (Category::Image, &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"]),
    (Category::Subtitle, &["srt", "sub", "sbv", "vtt", "ass", "ssa", "idx"]),
    (
        Category::Ebook,
        &["pdf", "epub", "mobi", "azw", "azw3", "djvu", "cbz", "cbr", "fb2", "lit"],
    ),
    (
        Category::Document,
        &["doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "txt"],
    ),
    (Category::App, &["exe", "msi", "dmg", "pkg", "deb", "rpm"]),
    (Category::Android, &["apk"]),
    (
        Category::Iso,
        &["iso", "img", "bin", "cue", "nrg", "mdf", "mds", "ccd", "cif", "c2d"],
    ),
    (
        Category::Script,
        &[
            "py", "sh", "bat", "cmd", "ps1", "vbs", "js", "php", "pl", "rb", "java", "cpp", "cs",
            "html", "css", "xml", "json", "yaml", "yml", "toml", "ini", "cfg", "conf", "log", "md",
            "rst",
        ],
    ),
];

/// Extension -> category lookup table.
#[derive(Debug, Clone, Default)]
pub struct ExtensionTable {
    map: HashMap<String, Category>,
}

impl ExtensionTable {
    /// Build a table from typed rules. The first rule naming an extension wins.
    pub fn new<'a, I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (Category, &'a [&'a str])>,
    {
        let mut table = Self::default();
        for (category, exts) in rules {
            for ext in exts {
                table.insert_if_absent(ext, category);
            }
        }
        table
    }

    /// Build a table from config rules, validating category names.
    pub fn from_rules(rules: &[ExtensionRule]) -> Result<Self> {
        let mut table = Self::default();
        for rule in rules {
            let category: Category = rule.category.parse()?;
            for ext in &rule.extensions {
                table.insert_if_absent(ext, category);
            }
        }
        Ok(table)
    }

    fn insert_if_absent(&mut self, ext: &str, category: Category) {
        let key = normalize_extension(ext);
        if !key.is_empty() {
            self.map.entry(key).or_insert(category);
        }
    }

    /// Look up an extension (case and leading dot are ignored).
    pub fn get(&self, ext: &str) -> Option<Category> {
        self.map.get(&normalize_extension(ext)).copied()
    }

    /// Number of known extensions.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Lowercase an extension and strip its leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// Maps file extensions and names to categories.
#[derive(Debug, Clone)]
pub struct TypeClassifier {
    table: ExtensionTable,
    episode_patterns: Vec<Regex>,
}

impl TypeClassifier {
    /// Create a classifier with the built-in extension table.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ExtensionTable::new(DEFAULT_EXTENSION_RULES.iter().copied()))
    }

    /// Create a classifier over the given table.
    pub fn new(table: ExtensionTable) -> Result<Self> {
        Ok(Self {
            table,
            episode_patterns: vec![
                Regex::new(r"s\d{1,2}e\d{1,2}")?,
                Regex::new(r"\b\d{1,2}x\d{2,3}\b")?,
            ],
        })
    }

    /// Classify a file from its extension and name.
    ///
    /// Video files whose name carries an episode marker are TV shows; every
    /// other file is looked up by extension alone.
    pub fn classify(&self, extension: &str, filename: &str) -> Category {
        let Some(category) = self.table.get(extension) else {
            return Category::Other;
        };

        if category == Category::Movie && self.is_episode_name(filename) {
            return Category::TvShow;
        }

        category
    }

    /// Whether a name looks like a TV episode.
    pub fn is_episode_name(&self, filename: &str) -> bool {
        let lower = filename.to_lowercase();
        self.episode_patterns.iter().any(|re| re.is_match(&lower))
    }

    /// Whether an extension is a video extension.
    pub fn is_video(&self, extension: &str) -> bool {
        self.table.get(extension) == Some(Category::Movie)
    }

    /// Whether an extension is video or audio.
    pub fn is_media(&self, extension: &str) -> bool {
        matches!(
            self.table.get(extension),
            Some(Category::Movie) | Some(Category::Audio)
        )
    }

    /// Pick the dominant category from categories in enumeration order.
    ///
    /// Noise categories are ignored. The most frequent category wins and a
    /// tie goes to the category seen first. Returns `Other` when nothing
    /// remains.
    pub fn dominant<I>(categories: I) -> Category
    where
        I: IntoIterator<Item = Category>,
    {
        let mut counts: Vec<(Category, usize)> = Vec::new();
        for category in categories.into_iter().filter(|c| !c.is_noise()) {
            match counts.iter_mut().find(|(c, _)| *c == category) {
                Some((_, n)) => *n += 1,
                None => counts.push((category, 1)),
            }
        }

        // max_by_key keeps the last maximum, so walk in reverse to keep the first.
        counts
            .into_iter()
            .rev()
            .max_by_key(|(_, n)| *n)
            .map(|(c, _)| c)
            .unwrap_or(Category::Other)
    }
}
