//! File Sorter CLI
//!
//! A command-line tool that classifies files and directories and sorts them
//! into category folders.

use clap::Parser;
use file_sorter::cli::{
    args::{Cli, Commands},
    commands::{clean, info, layout, sort},
};
use file_sorter::core::context::NodeContext;
use file_sorter::core::sorter::SortOptions;
use file_sorter::models::config;

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config = config::load_config(cli.config.as_deref())?;

    // Run the appropriate command
    match cli.command {
        Commands::Sort {
            path,
            dry_run,
            delete_remaining,
            on_conflict,
            output,
        } => {
            let options = SortOptions {
                verbose: cli.verbose,
                dry_run,
                delete_remaining,
                progress: true,
            };
            let report = sort::sort(&config, &path, options, on_conflict, output.as_deref())?;
            if report.has_failures() {
                anyhow::bail!("Some entries could not be sorted. See the summary above.");
            }
        }

        Commands::Clean { names } => {
            let context = NodeContext::from_config(&config)?;
            clean::clean(&context, &names)?;
        }

        Commands::Info { path } => {
            let context = NodeContext::from_config(&config)?;
            info::info(&context, &path)?;
        }

        Commands::Unpack { dir, clean_names } => {
            let context = NodeContext::from_config(&config)?;
            layout::unpack(&context, &dir, clean_names)?;
        }

        Commands::Pack { file } => {
            let context = NodeContext::from_config(&config)?;
            layout::pack(&context, &file)?;
        }

        Commands::Merge { target, source } => {
            let context = NodeContext::from_config(&config)?;
            layout::merge(&context, &target, &source)?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("file_sorter=debug")
    } else {
        EnvFilter::new("file_sorter=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
