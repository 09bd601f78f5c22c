//! Sort command implementation.
//!
//! Sorts a directory's entries into category folders and optionally writes
//! a JSON report of every decision.

use crate::core::sorter::{SortOptions, Sorter};
use crate::models::config::{Config, ConflictPolicy};
use crate::models::report::{self, SortReport, SortState};
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Sort a path.
pub fn sort(
    config: &Config,
    path: &Path,
    options: SortOptions,
    on_conflict: Option<ConflictPolicy>,
    output: Option<&Path>,
) -> Result<SortReport> {
    if options.dry_run {
        println!("{}", "[DRY RUN] Nothing will be moved".bold().yellow());
    } else {
        println!("{}", "[SORT] Sorting...".bold().cyan());
    }
    println!("  {} {}", "Path:".bold(), path.display());
    println!();

    let mut config = config.clone();
    if let Some(policy) = on_conflict {
        config.sorting.on_conflict = policy;
    }

    let sorter = Sorter::from_config(&config, options)?;
    let report = sorter.process_path(path)?;

    print_summary(&report);

    if let Some(output) = output {
        report::save_report(&report, output)?;
        println!("{} {}", "[OK] Report saved to".green(), output.display());
    }

    Ok(report)
}

fn print_summary(report: &SortReport) {
    println!();
    println!("{}", "[Sort Summary]".bold().green());
    if report.dry_run {
        println!("  {} {}", "Resolved:".bold(), report.count(SortState::Resolved));
        println!("  {} {}", "Planned moves:".bold(), report.total_moves());
    } else {
        println!("  {} {}", "Moved:".bold(), report.count(SortState::Moved));
        println!("  {} {}", "Cleaned up:".bold(), report.count(SortState::CleanedUp));
        println!("  {} {}", "Files moved:".bold(), report.total_moves());
    }
    println!("  {} {}", "Skipped:".bold(), report.skipped());
    println!("  {} {}", "Failed:".bold(), report.count(SortState::Failed));

    for outcome in report.outcomes.iter().filter(|o| o.state == SortState::Failed) {
        println!(
            "    {} {}: {}",
            "-".red(),
            outcome.source.display(),
            outcome.error.as_deref().unwrap_or("")
        );
    }
}
