//! Name cleaning heuristics.
//!
//! Turns raw release-style names such as
//! `The.Matrix.1999.1080p.BluRay.x264-GROUP` into comparison keys
//! (`the matrix 1999`) and extracts years and season/episode markers.

use crate::models::config::CleaningConfig;
use crate::Result;
use regex::Regex;
use std::collections::HashSet;

/// Substrings replaced with a space. Multi-character markers come first so
/// `5.1` is consumed before the `.` rule splits it. A marker that starts or
/// ends with a digit only matches where it is not glued to another digit, so
/// `1995.1080p` keeps its year.
pub const DEFAULT_NOISE_CHARS: &[&str] = &[
    "5.1", "4.0", ".", "-", "_", "[", "]", "{", "}", "~", "+", "(", ")", "!",
];

/// Resolution, codec, source, language and release-group tokens.
pub const DEFAULT_NOISE_WORDS: &[&str] = &[
    "1080", "1080i", "1080p", "10bit", "1920x1080", "2160p", "2vf", "480p", "720p", "7sins",
    "4k", "4klight", "6ch", "aac", "aaclc", "abcollection", "ac 3", "ac3", "acc", "acool",
    "amzn", "ark01", "av1", "avc", "bbc", "bbt", "bdrip", "benh4", "bit", "bluray",
    "bluray1080p", "brrip", "btt", "buret", "ccats", "ch", "chris44", "custom", "darkjuju",
    "dd", "ddp", "directors cut", "dl", "dolby vision", "dread team", "dts", "dvdrip",
    "dvd rip", "eac3", "eaulive", "en", "eng", "extended", "extreme", "fasandraeberne",
    "final cut", "flaskepost", "fr", "fre", "french", "french(vff)", "frosties", "ftmvhd", "fw",
    "gbx", "ght", "ghz", "gismo65", "gwen", "h264", "h265", "h4s5s", "hd", "hdl", "hdlight",
    "hdma", "hdr", "hdtv", "he", "hevc", "hush", "integral", "integrale", "internal", "jiheff",
    "k7", "kaf", "kfl", "kvinden", "lazarus", "lcds", "libertad", "luminus", "mhd", "mhdgz",
    "mkv", "mm91", "moe", "mtl666", "multi", "multi3", "nf", "noex", "nobodyperfect",
    "non censurée", "notag", "nyu", "owii", "p4t4t3", "pop", "pophd", "portos", "qtz",
    "remastered", "romkent", "se7en", "serqph", "shc23", "slayer", "slay3r", "srt", "stereo",
    "tf", "title1", "tonyk", "tr", "truefrench", "trunkdu92", "tvwh0res", "unrated", "uptopol",
    "utt", "version", "vf", "vf2", "vff", "vfi", "vfq", "vlis", "vmpp", "vo", "vof", "vost",
    "vostfr", "web", "web dl", "webdl", "webrip", "x264", "x265", "xvid", "zeusfaber", "zone80",
    "zza",
];

/// Normalizes raw file and directory names.
#[derive(Debug, Clone)]
pub struct NameCleaner {
    noise_chars: Vec<NoiseMarker>,
    noise_set: HashSet<String>,
    noise_words: Option<Regex>,
    brackets: Regex,
    spaces: Regex,
    empty_groups: Regex,
    year: Regex,
    year_in_parens: Regex,
    season_episode: Regex,
    season_marker: Regex,
    episode_marker: Regex,
    cross_marker: Regex,
}

impl NameCleaner {
    /// Create a cleaner with the built-in vocabularies.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_NOISE_CHARS, DEFAULT_NOISE_WORDS)
    }

    /// Create a cleaner from the cleaning section of the config.
    pub fn from_config(config: &CleaningConfig) -> Result<Self> {
        Self::new(&config.noise_chars, &config.noise_words)
    }

    /// Create a cleaner with custom vocabularies.
    pub fn new<C, W>(noise_chars: &[C], noise_words: &[W]) -> Result<Self>
    where
        C: AsRef<str>,
        W: AsRef<str>,
    {
        let noise_chars = noise_chars
            .iter()
            .map(|c| c.as_ref().to_lowercase())
            .filter(|c| !c.is_empty())
            .map(|c| NoiseMarker::new(&c))
            .collect::<Result<Vec<_>>>()?;

        let mut words: Vec<String> = noise_words
            .iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        words.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        words.dedup();

        let noise_words = if words.is_empty() {
            None
        } else {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(r"\b(?:{})\b", alternation))?)
        };

        Ok(Self {
            noise_chars,
            noise_set: words.into_iter().collect(),
            noise_words,
            brackets: Regex::new(r"\[.*?\]|\(.*?\)")?,
            spaces: Regex::new(r"\s+")?,
            empty_groups: Regex::new(r"\(\s*\)|\[\s*\]")?,
            year: Regex::new(r"\b((?:19|20)\d{2})\b")?,
            year_in_parens: Regex::new(r"\(((?:19|20)\d{2})\)")?,
            season_episode: Regex::new(
                r"(?i)\bs(?:aison|eason)?\s*(\d{1,2})\s*e(?:pisode)?\s*(\d{1,2})|\bs(?:aison|eason)?\s*(\d{1,2})\b|\be(?:pisode)?\s*(\d{1,2})\b|\b(\d{1,2})x(\d{2,3})\b",
            )?,
            season_marker: Regex::new(r"(?i)\bs(?:aison|eason)?\s*\d{1,2}")?,
            episode_marker: Regex::new(r"(?i)\be(?:pisode)?\s*\d{1,2}")?,
            cross_marker: Regex::new(r"\b\d{1,2}x\d{2,3}\b")?,
        })
    }

    /// Clean a raw name into its canonical comparison key.
    ///
    /// The result is lowercase, free of bracketed groups, punctuation and
    /// noise words, with single spaces. It may be empty.
    pub fn clean(&self, raw: &str) -> String {
        let mut current = self.clean_once(raw);
        loop {
            let next = self.clean_once(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn clean_once(&self, raw: &str) -> String {
        let lower = raw.to_lowercase();
        let stripped = self.brackets.replace_all(&lower, "");
        let mut name = self.strip_release_group(stripped.trim()).to_string();

        for marker in &self.noise_chars {
            name = marker.replace(&name);
        }
        name = self.collapse_spaces(&name);

        if let Some(words) = &self.noise_words {
            name = words.replace_all(&name, " ").into_owned();
        }

        self.collapse_spaces(&name)
    }

    /// Drop a trailing `-tag` when the token before the hyphen is noise,
    /// as in `x264-group`. `spider-man` is left alone.
    fn strip_release_group<'a>(&self, name: &'a str) -> &'a str {
        let Some(idx) = name.rfind('-') else {
            return name;
        };
        let tag = &name[idx + 1..];
        if tag.is_empty() || !tag.chars().all(char::is_alphanumeric) {
            return name;
        }
        let head = &name[..idx];
        let previous = head
            .rsplit(|c: char| c == '.' || c == '_' || c == '-' || c.is_whitespace())
            .next()
            .unwrap_or("");
        if self.noise_set.contains(previous) {
            head
        } else {
            name
        }
    }

    fn collapse_spaces(&self, name: &str) -> String {
        self.spaces.replace_all(name, " ").trim().to_string()
    }

    /// Clean a file name, keeping its extension.
    ///
    /// Falls back to the raw stem when cleaning leaves nothing.
    pub fn clean_file_name(&self, stem: &str, extension: Option<&str>) -> String {
        let cleaned = self.clean_stem_or_raw(stem);
        match extension {
            Some(ext) if !ext.is_empty() => format!("{}.{}", cleaned, ext),
            _ => cleaned,
        }
    }

    /// Cleaned stem, or the raw stem when cleaning empties it.
    pub fn clean_stem_or_raw(&self, stem: &str) -> String {
        let cleaned = self.clean(stem);
        if cleaned.is_empty() {
            stem.to_string()
        } else {
            cleaned
        }
    }

    /// Find a release year (1900-2099) in a name.
    ///
    /// A parenthesized year wins over a bare one. Among bare years the last
    /// one wins, so `Blade.Runner.2049.2017` is from 2017.
    pub fn year(&self, name: &str) -> Option<u16> {
        self.year_token(name).map(|(_, year)| year)
    }

    /// Remove the year token picked by [`NameCleaner::year`] from a name.
    /// Other year-like numbers are kept.
    pub fn name_without_year(&self, name: &str) -> String {
        let without = match self.year_token(name) {
            Some((range, _)) => format!("{} {}", &name[..range.start], &name[range.end..]),
            None => name.to_string(),
        };
        let without = self.empty_groups.replace_all(&without, "");
        self.collapse_spaces(&without)
    }

    // Byte range of the chosen year token (with its parentheses) and its value.
    fn year_token(&self, name: &str) -> Option<(std::ops::Range<usize>, u16)> {
        let (whole, year) = match self.year_in_parens.captures(name) {
            Some(caps) => (caps.get(0)?, caps.get(1)?),
            None => {
                let caps = self.year.captures_iter(name).last()?;
                (caps.get(0)?, caps.get(1)?)
            }
        };
        Some((whole.range(), year.as_str().parse().ok()?))
    }

    /// Find season and episode numbers.
    ///
    /// A combined `s01e02` marker wins. Otherwise the first season-only and
    /// the first episode-only markers are merged.
    pub fn season_episode(&self, name: &str) -> (Option<u16>, Option<u16>) {
        let mut season = None;
        let mut episode = None;

        for caps in self.season_episode.captures_iter(name) {
            let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u16>().ok());

            if let (Some(s), Some(e)) = (number(1), number(2)) {
                return (Some(s), Some(e));
            }
            if let (Some(s), Some(e)) = (number(5), number(6)) {
                return (Some(s), Some(e));
            }
            if season.is_none() {
                season = number(3);
            }
            if episode.is_none() {
                episode = number(4);
            }
        }

        (season, episode)
    }

    /// Remove season and episode markers from a name.
    pub fn name_without_season_episode(&self, name: &str) -> String {
        let without = self.season_marker.replace_all(name, "");
        let without = self.episode_marker.replace_all(&without, "");
        let without = self.cross_marker.replace_all(&without, "");
        self.collapse_spaces(&without)
    }
}

/// A noise character or marker, replaced with a space.
#[derive(Debug, Clone)]
enum NoiseMarker {
    Plain(String),
    // Markers with digits at their edges, e.g. `5.1`.
    DigitGuarded(Regex),
}

impl NoiseMarker {
    fn new(marker: &str) -> Result<Self> {
        let starts_digit = marker.starts_with(|c: char| c.is_ascii_digit());
        let ends_digit = marker.ends_with(|c: char| c.is_ascii_digit());
        if !starts_digit && !ends_digit {
            return Ok(NoiseMarker::Plain(marker.to_string()));
        }

        let before = if starts_digit { "(^|[^0-9])" } else { "()" };
        let after = if ends_digit { "($|[^0-9])" } else { "()" };
        Ok(NoiseMarker::DigitGuarded(Regex::new(&format!(
            "{}{}{}",
            before,
            regex::escape(marker),
            after
        ))?))
    }

    fn replace(&self, name: &str) -> String {
        match self {
            NoiseMarker::Plain(marker) => name.replace(marker.as_str(), " "),
            NoiseMarker::DigitGuarded(re) => re.replace_all(name, "${1} ${2}").into_owned(),
        }
    }
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner() -> NameCleaner {
        NameCleaner::with_defaults().unwrap()
    }

    #[test]
    fn test_clean_release_name() {
        let c = cleaner();
        assert_eq!(
            c.clean("The.Matrix.1999.1080p.BluRay.x264-GROUP"),
            "the matrix 1999"
        );
        assert_eq!(c.clean("Show.Name.S02E05.720p"), "show name s02e05");
    }

    #[test]
    fn test_clean_strips_brackets_and_parens() {
        let c = cleaner();
        assert_eq!(c.clean("[RARBG] Heat (1995) [1080p]"), "heat");
        assert_eq!(c.clean("Alien (Director's Cut)"), "alien");
    }

    #[test]
    fn test_clean_keeps_words_containing_noise() {
        let c = cleaner();
        // "he" and "en" are noise words but must not be cut out of other words.
        assert_eq!(c.clean("The Hen Went Home"), "the hen went home");
        assert_eq!(c.clean("Spider-Man"), "spider man");
    }

    #[test]
    fn test_clean_multi_word_noise() {
        let c = cleaner();
        assert_eq!(c.clean("Movie.WEB-DL.DD5.1"), "movie");
        assert_eq!(c.clean("Movie Dolby Vision"), "movie");
    }

    #[test]
    fn test_clean_idempotent() {
        let c = cleaner();
        let samples = [
            "The.Matrix.1999.1080p.BluRay.x264-GROUP",
            "Movie dolby.x264.vision",
            "ac.x265.3 Title",
            "(((weird]]] name__--",
            "Été 85 [FR] 2020 MULTI",
            "",
            "...",
        ];
        for s in samples {
            let once = c.clean(s);
            assert_eq!(c.clean(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_clean_empty_result() {
        let c = cleaner();
        assert_eq!(c.clean("1080p.x264"), "");
        assert_eq!(c.clean_stem_or_raw("1080p.x264"), "1080p.x264");
        assert_eq!(c.clean_file_name("1080p.x264", Some("mkv")), "1080p.x264.mkv");
    }

    #[test]
    fn test_clean_file_name_keeps_extension() {
        let c = cleaner();
        assert_eq!(
            c.clean_file_name("Show.Name.S02E05.720p", Some("mkv")),
            "show name s02e05.mkv"
        );
        assert_eq!(c.clean_file_name("Some_Folder", None), "some folder");
    }

    #[test]
    fn test_custom_vocabulary() {
        let c = NameCleaner::new(&["."], &["foo"]).unwrap();
        assert_eq!(c.clean("Bar.Foo.Baz-Qux"), "bar baz-qux");
        let empty = NameCleaner::new::<&str, &str>(&[], &[]).unwrap();
        assert_eq!(empty.clean("  A   B  "), "a b");
    }

    #[test]
    fn test_year() {
        let c = cleaner();
        assert_eq!(c.year("The.Matrix.1999.1080p"), Some(1999));
        assert_eq!(c.year("Movie (2021)"), Some(2021));
        assert_eq!(c.year("Blade Runner 2049 (2017)"), Some(2017));
        assert_eq!(c.year("Movie 1920x1080"), None);
        assert_eq!(c.year("Movie 1080p"), None);
        assert_eq!(c.year("Movie 2150"), None);
        assert_eq!(c.year("Blade.Runner.2049.2017.1080p"), Some(2017));
        assert_eq!(c.year("2001.A.Space.Odyssey.1968"), Some(1968));
    }

    #[test]
    fn test_name_without_year() {
        let c = cleaner();
        assert_eq!(c.name_without_year("the matrix 1999"), "the matrix");
        assert_eq!(c.name_without_year("Heat (1995)"), "Heat");
        assert_eq!(c.name_without_year("no year here"), "no year here");
        assert_eq!(
            c.name_without_year("blade runner 2049 2017"),
            "blade runner 2049"
        );
        assert_eq!(c.name_without_year("Heat (1995) 2004"), "Heat 2004");
    }

    #[test]
    fn test_bitrate_markers_keep_years() {
        let c = cleaner();
        assert_eq!(c.clean("Heat.1995.1080p.BluRay.x264-GROUP"), "heat 1995");
        assert_eq!(c.clean("Movie.2015.1080p"), "movie 2015");
        assert_eq!(c.clean("Film.2004.0.WEB"), "film 2004 0");
        assert_eq!(c.clean("Movie.DTS.5.1.x264"), "movie");
        assert_eq!(c.clean("Movie.AAC4.0"), "movie");
    }

    #[test]
    fn test_season_episode() {
        let c = cleaner();
        assert_eq!(c.season_episode("Show.S02E05.720p"), (Some(2), Some(5)));
        assert_eq!(c.season_episode("show s1e3"), (Some(1), Some(3)));
        assert_eq!(c.season_episode("Show Season 3 Episode 12"), (Some(3), Some(12)));
        assert_eq!(c.season_episode("Show Saison 4"), (Some(4), None));
        assert_eq!(c.season_episode("Show Episode 7"), (None, Some(7)));
        assert_eq!(c.season_episode("Show S03 - E08"), (Some(3), Some(8)));
        assert_eq!(c.season_episode("Show 2x05"), (Some(2), Some(5)));
        assert_eq!(c.season_episode("Just A Movie"), (None, None));
    }

    #[test]
    fn test_name_without_season_episode() {
        let c = cleaner();
        assert_eq!(c.name_without_season_episode("show name s02e05"), "show name");
        assert_eq!(
            c.name_without_season_episode("show name season 1 episode 2"),
            "show name"
        );
        assert_eq!(c.name_without_season_episode("show 1x02"), "show");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("the matrix (1999)"), "The matrix (1999)");
        assert_eq!(capitalize("SHOW name"), "Show name");
        assert_eq!(capitalize(""), "");
    }
}
