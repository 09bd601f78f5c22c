//! Clean command implementation.
//!
//! Shows what the cleaner and classifier make of raw names, without touching
//! the filesystem.

use crate::core::context::{split_file_name, NodeContext};
use crate::Result;
use colored::Colorize;

/// Print the cleaned form of each name.
pub fn clean(context: &NodeContext, names: &[String]) -> Result<()> {
    for name in names {
        let (stem, ext) = split_file_name(name);
        let cleaner = &context.cleaner;

        println!("{}", name.bold());
        println!(
            "  {} {}",
            "Cleaned:".bold(),
            cleaner.clean_file_name(stem, ext)
        );
        if let Some(year) = cleaner.year(name) {
            println!("  {} {}", "Year:".bold(), year);
        }
        match cleaner.season_episode(name) {
            (None, None) => {}
            (season, episode) => println!(
                "  {} {} / {}",
                "Season/Episode:".bold(),
                season.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                episode.map(|e| e.to_string()).unwrap_or_else(|| "-".to_string())
            ),
        }
        println!("  {} {}", "Type:".bold(), context.classify_name(name));
        if ext.is_some_and(|e| context.classifier.is_media(e)) {
            println!("  {} yes", "Media:".bold());
        }
    }
    Ok(())
}
