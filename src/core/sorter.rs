//! Move-based sorting of a directory's children into category folders.

use super::cleaner::capitalize;
use super::context::NodeContext;
use super::node::{Directory, File, FileSystemNode, Node};
use crate::models::category::Category;
use crate::models::config::{Config, ConflictPolicy};
use crate::models::report::{MoveRecord, NodeOutcome, SortReport, SortState};
use crate::models::rules::SortRules;
use crate::utils::fs as fsutil;
use crate::{Error, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sorter flags.
#[derive(Debug, Clone, Default)]
pub struct SortOptions {
    /// Print a trace line for every decision.
    pub verbose: bool,
    /// Compute destinations without touching the filesystem.
    pub dry_run: bool,
    /// Remove a source directory after its elements were extracted.
    pub delete_remaining: bool,
    /// Show a progress bar (ignored in verbose mode).
    pub progress: bool,
}

/// Sorts nodes into category folders.
pub struct Sorter {
    rules: SortRules,
    context: Arc<NodeContext>,
    options: SortOptions,
}

impl Sorter {
    pub fn new(rules: SortRules, context: Arc<NodeContext>, options: SortOptions) -> Self {
        Self {
            rules,
            context,
            options,
        }
    }

    /// Build a sorter from configuration.
    pub fn from_config(config: &Config, options: SortOptions) -> Result<Self> {
        Ok(Self::new(
            SortRules::from_config(&config.sorting)?,
            NodeContext::from_config(config)?,
            options,
        ))
    }

    pub fn rules(&self) -> &SortRules {
        &self.rules
    }

    pub fn context(&self) -> &Arc<NodeContext> {
        &self.context
    }

    /// Open a path and sort it.
    pub fn process_path(&self, path: &Path) -> Result<SortReport> {
        let root = Node::open(path, &self.context)?;
        self.process(root)
    }

    /// Sort a root node.
    ///
    /// A directory root has each of its visible children sorted into category
    /// folders created inside it. A file root is sorted into category folders
    /// next to it. Children are listed once, before anything moves.
    ///
    /// A skipped file can still be picked up later as a companion of a
    /// sibling. Its own outcome keeps the skip state and the move is listed
    /// under the sibling.
    pub fn process(&self, root: Node) -> Result<SortReport> {
        let (sorted_root, children) = match root {
            Node::Directory(dir) => {
                let children: Vec<Node> = dir.iter(false, false).collect();
                (dir.path().to_path_buf(), children)
            }
            Node::File(file) => {
                let parent = file
                    .parent()
                    .map(Path::to_path_buf)
                    .ok_or_else(|| Error::other(format!("Cannot sort {}", file.name())))?;
                (parent, vec![Node::File(file)])
            }
        };

        tracing::info!(
            "Sorting {} entries in {:?}{}",
            children.len(),
            sorted_root,
            if self.options.dry_run { " (dry run)" } else { "" }
        );

        let pb = self.progress_bar(children.len() as u64);
        let mut report = SortReport::new(sorted_root.clone(), self.options.dry_run);
        let mut handled: HashSet<PathBuf> = HashSet::new();

        for node in children {
            pb.set_message(node.name().to_string());
            pb.inc(1);

            // Already moved along with an earlier sibling.
            if handled.contains(node.path()) {
                tracing::debug!("Already sorted as a companion: {:?}", node.path());
                continue;
            }

            let outcome = self.sort_node(node, &sorted_root, &mut handled);
            if outcome.state == SortState::Failed {
                tracing::error!(
                    "Failed to sort {}: {}",
                    outcome.source.display(),
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            report.outcomes.push(outcome);
        }

        pb.finish_and_clear();

        tracing::info!(
            "Sorted {} entries: {} moved, {} skipped, {} failed",
            report.outcomes.len(),
            report.count(SortState::Moved)
                + report.count(SortState::CleanedUp)
                + report.count(SortState::Resolved),
            report.skipped(),
            report.count(SortState::Failed)
        );

        Ok(report)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.options.progress || self.options.verbose {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb
    }

    /// Run one node through the sorting steps.
    fn sort_node(
        &self,
        node: Node,
        sorted_root: &Path,
        handled: &mut HashSet<PathBuf>,
    ) -> NodeOutcome {
        let mut outcome = NodeOutcome::new(node.path().to_path_buf());

        if node.is_dir() && self.rules.is_sorted_dir(node.name()) {
            self.trace("SKIP", &format!("{} is a sorted directory", node.name()));
            outcome.state = SortState::SkippedSortedDir;
            return outcome;
        }

        let category = match node.category() {
            Ok(category) => category,
            Err(e) => return failed(outcome, e),
        };
        outcome.category = Some(category);

        let destination = match self.rules.destination(category) {
            Some(dir) if self.rules.is_allowed(category) => sorted_root.join(dir),
            _ => {
                self.trace(
                    "SKIP",
                    &format!("{} ({}) is not a sorted type", node.name(), category),
                );
                outcome.state = SortState::SkippedDisallowedType;
                return outcome;
            }
        };

        let folder = self.resolve_folder(&node, category, &destination);
        self.trace(
            "TYPE",
            &format!("{} -> {} -> {}", node.name(), category, folder.display()),
        );
        outcome.destination = Some(folder.clone());

        let extracted = node.is_dir() && category == Category::TvShow;
        let elements = match self.select_elements(&node, category, handled) {
            Ok(elements) => elements,
            Err(e) => return failed(outcome, e),
        };

        let mut conflicts = 0;
        for element in elements {
            handled.insert(element.path().to_path_buf());
            let target = folder.join(element.cleaned_name());
            match self.place(element, target) {
                Ok(Some(record)) => outcome.moves.push(record),
                Ok(None) => conflicts += 1,
                Err(e) => return failed(outcome, e),
            }
        }

        if outcome.moves.is_empty() && conflicts > 0 {
            outcome.state = SortState::SkippedConflict;
            return outcome;
        }

        // Skipped elements are still inside the source directory.
        let cleanup = extracted && self.options.delete_remaining && conflicts == 0;
        if extracted && self.options.delete_remaining && conflicts > 0 {
            tracing::warn!(
                "Keeping {}: {} element(s) were left in place",
                node.path().display(),
                conflicts
            );
        }

        if self.options.dry_run {
            outcome.state = SortState::Resolved;
            if cleanup {
                self.trace("DEL", &format!("would delete {}", node.path().display()));
            }
            return outcome;
        }

        outcome.state = SortState::Moved;

        if cleanup {
            let path = node.path().to_path_buf();
            if let Err(e) = node.delete(true) {
                return failed(outcome, e);
            }
            self.trace("DEL", &format!("deleted {}", path.display()));
            outcome.state = SortState::CleanedUp;
        }

        outcome
    }

    /// Destination folder for a node of a given category.
    ///
    /// Movie files get a `Name (year)` folder, TV shows a folder named after
    /// the show, and everything else lands directly in the category folder.
    pub fn resolve_folder(&self, node: &Node, category: Category, destination: &Path) -> PathBuf {
        let cleaner = &self.context.cleaner;
        match (category, node.is_file()) {
            (Category::Movie, true) => {
                let cleaned = node.cleaned_stem();
                let name = match cleaner.year(node.stem()) {
                    Some(year) => {
                        let base = cleaner.name_without_year(cleaned);
                        let base = if base.is_empty() { cleaned.to_string() } else { base };
                        format!("{} ({})", capitalize(&base), year)
                    }
                    None => capitalize(cleaned),
                };
                destination.join(name)
            }
            (Category::TvShow, _) => {
                let cleaned = node.cleaned_stem();
                let show = cleaner.name_without_season_episode(cleaned);
                let show = if show.is_empty() { cleaned.to_string() } else { show };
                destination.join(capitalize(&show))
            }
            _ => destination.to_path_buf(),
        }
    }

    /// Nodes to move for a given node.
    ///
    /// A TV show directory yields its TV show files and their companions;
    /// the rest of its content stays behind. A file brings along sibling
    /// companions whose stem starts with its own.
    fn select_elements(
        &self,
        node: &Node,
        category: Category,
        handled: &HashSet<PathBuf>,
    ) -> Result<Vec<Node>> {
        match node {
            Node::Directory(dir) if category == Category::TvShow => Ok(dir
                .files(true)
                .filter(|f| match f.category() {
                    Ok(c) => c == Category::TvShow || self.rules.is_companion(Category::TvShow, c),
                    Err(_) => false,
                })
                .map(Node::File)
                .collect()),
            Node::Directory(_) => Ok(vec![node.clone()]),
            Node::File(file) => {
                let mut elements = vec![node.clone()];
                elements.extend(
                    self.companions_of(file, category, handled)?
                        .into_iter()
                        .map(Node::File),
                );
                Ok(elements)
            }
        }
    }

    fn companions_of(
        &self,
        file: &File,
        category: Category,
        handled: &HashSet<PathBuf>,
    ) -> Result<Vec<File>> {
        if self.rules.companions(category).next().is_none() {
            return Ok(Vec::new());
        }
        let Some(parent) = file.parent() else {
            return Ok(Vec::new());
        };

        let stem = file.stem().to_lowercase();
        let siblings = Directory::open(parent, &self.context)?;
        Ok(siblings
            .files(false)
            .filter(|f| f.path() != file.path() && !handled.contains(f.path()))
            .filter(|f| f.stem().to_lowercase().starts_with(&stem))
            .filter(|f| match f.category() {
                Ok(c) => self.rules.is_companion(category, c),
                Err(_) => false,
            })
            .collect())
    }

    /// Move one element to `target`, applying the conflict policy.
    ///
    /// Returns `None` when the element was left in place.
    fn place(&self, mut element: Node, target: PathBuf) -> Result<Option<MoveRecord>> {
        let from = element.path().to_path_buf();
        if target == from {
            tracing::debug!("{:?} is already in place", from);
            return Ok(None);
        }

        let target = if target.exists() {
            match self.rules.on_conflict {
                ConflictPolicy::Overwrite => target,
                ConflictPolicy::Skip => {
                    self.trace("KEEP", &format!("{} exists", target.display()));
                    tracing::warn!("Destination exists, skipping: {:?}", target);
                    return Ok(None);
                }
                ConflictPolicy::RenameWithSuffix => fsutil::unique_path(&target),
            }
        } else {
            target
        };

        if self.options.dry_run {
            self.trace(
                "PLAN",
                &format!("{} -> {}", from.display(), target.display()),
            );
            return Ok(Some(MoveRecord { from, to: target }));
        }

        element.move_to(&target)?;
        self.trace(
            "MOVE",
            &format!("{} -> {}", from.display(), element.path().display()),
        );
        Ok(Some(MoveRecord {
            from,
            to: element.path().to_path_buf(),
        }))
    }

    fn trace(&self, tag: &str, message: &str) {
        if !self.options.verbose {
            return;
        }
        let tag = format!("[{}]", tag);
        let tag = match tag.as_str() {
            "[SKIP]" | "[KEEP]" => tag.yellow(),
            "[MOVE]" | "[DEL]" => tag.green(),
            "[PLAN]" => tag.cyan(),
            _ => tag.blue(),
        };
        println!("{} {}", tag, message);
    }
}

fn failed(mut outcome: NodeOutcome, error: Error) -> NodeOutcome {
    outcome.state = SortState::Failed;
    outcome.error = Some(error.to_string());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sorter(options: SortOptions) -> Sorter {
        Sorter::new(
            SortRules::default(),
            NodeContext::with_defaults().unwrap(),
            options,
        )
    }

    fn node(path: &Path) -> Node {
        Node::open(path, &NodeContext::with_defaults().unwrap()).unwrap()
    }

    #[test]
    fn test_resolve_movie_file_folder() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("The.Matrix.1999.1080p.BluRay.x264-GROUP.mkv");
        fs::write(&path, "x").unwrap();

        let s = sorter(SortOptions::default());
        let folder = s.resolve_folder(&node(&path), Category::Movie, Path::new("/out/001-MOVIES"));
        assert_eq!(folder, PathBuf::from("/out/001-MOVIES/The matrix (1999)"));
    }

    #[test]
    fn test_resolve_movie_without_year() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Some.Movie.720p.mkv");
        fs::write(&path, "x").unwrap();

        let s = sorter(SortOptions::default());
        let folder = s.resolve_folder(&node(&path), Category::Movie, Path::new("/out/001-MOVIES"));
        assert_eq!(folder, PathBuf::from("/out/001-MOVIES/Some movie"));
    }

    #[test]
    fn test_resolve_tvshow_folder() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Show.Name.S02E05.720p.mkv");
        fs::write(&path, "x").unwrap();

        let s = sorter(SortOptions::default());
        let folder = s.resolve_folder(&node(&path), Category::TvShow, Path::new("/out/002-TVSHOWS"));
        assert_eq!(folder, PathBuf::from("/out/002-TVSHOWS/Show name"));
    }

    #[test]
    fn test_resolve_movie_directory_is_category_root() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Heat.1995");
        fs::create_dir(&path).unwrap();

        let s = sorter(SortOptions::default());
        let folder = s.resolve_folder(&node(&path), Category::Movie, Path::new("/out/001-MOVIES"));
        assert_eq!(folder, PathBuf::from("/out/001-MOVIES"));
    }

    #[test]
    fn test_other_category_goes_to_root() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("song.mp3");
        fs::write(&path, "x").unwrap();

        let s = sorter(SortOptions::default());
        let folder = s.resolve_folder(&node(&path), Category::Audio, Path::new("/out/004-AUDIO"));
        assert_eq!(folder, PathBuf::from("/out/004-AUDIO"));
    }

    #[test]
    fn test_failed_outcome_keeps_error() {
        let outcome = failed(
            NodeOutcome::new(PathBuf::from("/x")),
            Error::PathNotFound("/x".to_string()),
        );
        assert_eq!(outcome.state, SortState::Failed);
        assert_eq!(outcome.error.as_deref(), Some("Path not found: /x"));
    }
}
