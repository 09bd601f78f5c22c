//! Command line argument definitions.

use crate::models::config::ConflictPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// File Sorter - Classify files and sort them into category folders
#[derive(Parser, Debug)]
#[command(name = "file-sorter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config.toml file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sort a directory's entries (or a single file) into category folders
    Sort {
        /// Directory or file to sort
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Dry run - show what would be done
        #[arg(long)]
        dry_run: bool,

        /// Delete source directories after extracting their episodes
        #[arg(long)]
        delete_remaining: bool,

        /// What to do when a destination already exists
        #[arg(long, value_enum, value_name = "POLICY")]
        on_conflict: Option<ConflictPolicy>,

        /// Output path for the JSON sort report
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Show how names are cleaned and classified
    Clean {
        /// Raw file or directory names
        #[arg(value_name = "NAME", required = true)]
        names: Vec<String>,
    },

    /// Describe a file or directory
    Info {
        /// Path to describe
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Move a directory's entries into its parent and remove it
    Unpack {
        /// Directory to unpack
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Rename entries to their cleaned names
        #[arg(long)]
        clean_names: bool,
    },

    /// Move a file into a new directory named after it
    Pack {
        /// File to pack
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Move all entries of SOURCE into TARGET and remove SOURCE
    Merge {
        /// Directory receiving the entries
        #[arg(value_name = "TARGET")]
        target: PathBuf,

        /// Directory to empty and remove
        #[arg(value_name = "SOURCE")]
        source: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort() {
        let cli = Cli::parse_from([
            "file-sorter",
            "-v",
            "sort",
            "/data",
            "--dry-run",
            "--on-conflict",
            "rename",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Sort {
                path,
                dry_run,
                delete_remaining,
                on_conflict,
                output,
            } => {
                assert_eq!(path, PathBuf::from("/data"));
                assert!(dry_run);
                assert!(!delete_remaining);
                assert_eq!(on_conflict, Some(ConflictPolicy::RenameWithSuffix));
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_clean_requires_names() {
        assert!(Cli::try_parse_from(["file-sorter", "clean"]).is_err());
        let cli = Cli::try_parse_from(["file-sorter", "clean", "a.mkv", "b.mkv"]).unwrap();
        match cli.command {
            Commands::Clean { names } => assert_eq!(names.len(), 2),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["file-sorter", "info", "/x", "--config", "/etc/sorter.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/sorter.toml")));
    }
}
