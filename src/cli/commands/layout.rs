//! Unpack, pack and merge command implementations.

use crate::core::context::NodeContext;
use crate::core::node::{Directory, File, FileSystemNode};
use crate::Result;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

/// Move a directory's entries into its parent and remove it.
pub fn unpack(context: &Arc<NodeContext>, dir: &Path, clean_names: bool) -> Result<()> {
    let directory = Directory::open(dir, context)?;
    let name = directory.name().to_string();
    let moved = directory.unpack(clean_names)?;

    println!("{} {}", "[UNPACK]".bold().cyan(), name);
    for node in &moved {
        println!("  {} {}", "->".green(), node.path().display());
    }
    println!("{} {} entries moved", "[OK]".green(), moved.len());
    Ok(())
}

/// Move a file into a new directory named after its cleaned stem.
pub fn pack(context: &Arc<NodeContext>, file: &Path) -> Result<()> {
    let mut file = File::open(file, context)?;
    let directory = file.pack()?;

    println!(
        "{} {} -> {}",
        "[PACK]".bold().cyan(),
        file.name(),
        directory.path().display()
    );
    Ok(())
}

/// Move every entry of `source` into `target` and remove `source`.
pub fn merge(context: &Arc<NodeContext>, target: &Path, source: &Path) -> Result<()> {
    let mut target = Directory::open(target, context)?;
    let source = Directory::open(source, context)?;

    let shared = target.intersect_contents(&source);
    if !shared.is_empty() {
        println!(
            "{} {} entries exist in both directories and will be replaced:",
            "[WARNING]".bold().yellow(),
            shared.len()
        );
        for name in &shared {
            println!("  - {}", name);
        }
    }

    let source_path = source.path().to_path_buf();
    let moved = target.merge(source)?;
    println!(
        "{} {} entries from {} into {}",
        "[MERGE]".bold().cyan(),
        moved.len(),
        source_path.display(),
        target.path().display()
    );
    Ok(())
}
