//! File system node model.
//!
//! A node is a transient view of one path. Nothing is cached beyond the
//! metadata read at load time: every enumeration re-lists the filesystem,
//! and every mutating operation re-checks that the path still exists.
//!
//! Nodes do not implement `PartialEq`. Two comparisons are offered instead:
//! - [`FileSystemNode::same_name`] compares the `name` key only, which can
//!   conflate entries with the same name in different directories;
//! - [`FileSystemNode::same_entry`] compares canonical paths.

use super::context::NodeContext;
use crate::models::category::Category;
use crate::utils::fs as fsutil;
use crate::{Error, Result};
use chrono::{DateTime, Local, Utc};
use std::cell::Cell;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

/// Node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// Metadata shared by files and directories.
#[derive(Debug, Clone)]
pub struct NodeMeta {
    /// Canonical absolute path.
    pub path: PathBuf,
    /// Final path component.
    pub name: String,
    /// Name without extension (the full name for directories).
    pub stem: String,
    /// Cleaned name, with the raw extension for files.
    pub cleaned_name: String,
    /// Cleaned stem.
    pub cleaned_stem: String,
    /// Modification time at last load.
    pub modified: DateTime<Utc>,
}

impl NodeMeta {
    fn load(path: &Path, context: &NodeContext, kind: NodeKind) -> Result<(Self, std::fs::Metadata)> {
        fsutil::ensure_exists(path)?;
        let path = std::fs::canonicalize(path)?;
        let metadata = std::fs::metadata(&path)?;

        match kind {
            NodeKind::File if !metadata.is_file() => {
                return Err(Error::NotAFile(path.display().to_string()))
            }
            NodeKind::Directory if !metadata.is_dir() => {
                return Err(Error::NotADirectory(path.display().to_string()))
            }
            _ => {}
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let (stem, extension) = match kind {
            NodeKind::File => (
                path.file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| name.clone()),
                path.extension().map(|e| e.to_string_lossy().to_string()),
            ),
            NodeKind::Directory => (name.clone(), None),
        };

        let cleaned_stem = context.cleaner.clean_stem_or_raw(&stem);
        let cleaned_name = context
            .cleaner
            .clean_file_name(&stem, extension.as_deref());

        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok((
            Self {
                path,
                name,
                stem,
                cleaned_name,
                cleaned_stem,
                modified,
            },
            metadata,
        ))
    }
}

/// Capabilities shared by files and directories.
pub trait FileSystemNode {
    fn meta(&self) -> &NodeMeta;
    fn meta_mut(&mut self) -> &mut NodeMeta;
    fn context(&self) -> &Arc<NodeContext>;
    fn kind(&self) -> NodeKind;

    /// Size in bytes. Directories report the recursive sum of their files.
    fn size(&self) -> Result<u64>;

    /// Semantic category.
    fn category(&self) -> Result<Category>;

    /// Re-read metadata from the filesystem.
    fn reload(&mut self) -> Result<()>;

    fn path(&self) -> &Path {
        &self.meta().path
    }

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn stem(&self) -> &str {
        &self.meta().stem
    }

    fn cleaned_name(&self) -> &str {
        &self.meta().cleaned_name
    }

    fn cleaned_stem(&self) -> &str {
        &self.meta().cleaned_stem
    }

    fn modified(&self) -> DateTime<Utc> {
        self.meta().modified
    }

    fn parent(&self) -> Option<&Path> {
        self.path().parent()
    }

    fn is_hidden(&self) -> bool {
        fsutil::is_hidden_name(self.name())
    }

    fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Key used for name-based comparisons.
    fn name_key(&self) -> &str {
        self.name()
    }

    /// Name-based equality. Entries in different directories may match.
    fn same_name(&self, other: &dyn FileSystemNode) -> bool {
        self.name_key() == other.name_key()
    }

    /// Path-based identity.
    fn same_entry(&self, other: &dyn FileSystemNode) -> bool {
        self.path() == other.path()
    }

    /// Release year found in the raw name.
    fn year(&self) -> Option<u16> {
        self.context().cleaner.year(self.name())
    }

    /// Season and episode found in the raw name.
    fn season_episode(&self) -> (Option<u16>, Option<u16>) {
        self.context().cleaner.season_episode(self.name())
    }

    /// Modification time in local time.
    fn formatted_modified(&self, format: &str) -> String {
        self.modified().with_timezone(&Local).format(format).to_string()
    }

    /// Size in binary units, e.g. `1.50 GiB`.
    fn human_size(&self) -> Result<String> {
        Ok(humansize::format_size(self.size()?, humansize::BINARY))
    }

    /// Fail with `PathNotFound` when the path has vanished.
    fn ensure_exists(&self) -> Result<()> {
        fsutil::ensure_exists(self.path())
    }

    /// Move to `new_path`, creating parent directories as needed.
    ///
    /// A single rename: an existing file at `new_path` is replaced.
    fn move_to(&mut self, new_path: &Path) -> Result<()> {
        self.ensure_exists()?;
        let from = self.path().to_path_buf();
        fsutil::move_path(&from, new_path)?;
        tracing::debug!("Moved: {:?} -> {:?}", from, new_path);
        self.meta_mut().path = new_path.to_path_buf();
        self.reload()
    }

    /// Rename within the same parent directory.
    fn rename(&mut self, new_name: &str) -> Result<()> {
        fsutil::validate_entry_name(new_name)?;
        let target = match self.parent() {
            Some(parent) => parent.join(new_name),
            None => return Err(Error::other(format!("Cannot rename {}", self.name()))),
        };
        self.move_to(&target)
    }

    /// Rename to the cleaned name. Does nothing if it is already clean.
    fn clean_name(&mut self) -> Result<()> {
        let cleaned = self.cleaned_name().to_string();
        if cleaned == self.name() {
            return Ok(());
        }
        self.rename(&cleaned)
    }
}

/// A regular file.
#[derive(Debug, Clone)]
pub struct File {
    meta: NodeMeta,
    extension: Option<String>,
    size: u64,
    context: Arc<NodeContext>,
}

impl File {
    /// Open an existing file.
    pub fn open(path: &Path, context: &Arc<NodeContext>) -> Result<Self> {
        let (meta, metadata) = NodeMeta::load(path, context, NodeKind::File)?;
        let extension = fsutil::get_extension(&meta.path);
        Ok(Self {
            meta,
            extension,
            size: metadata.len(),
            context: Arc::clone(context),
        })
    }

    /// Lowercase extension without the dot.
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Copy to `new_path`, creating parents, and return the copy.
    pub fn copy_to(&self, new_path: &Path) -> Result<File> {
        self.ensure_exists()?;
        if let Some(parent) = new_path.parent() {
            fsutil::create_dir_all(parent)?;
        }
        std::fs::copy(self.path(), new_path)?;
        File::open(new_path, &self.context)
    }

    /// Move this file into a new sibling directory named after its cleaned stem.
    pub fn pack(&mut self) -> Result<Directory> {
        self.ensure_exists()?;
        let parent = self
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::other(format!("Cannot pack {}", self.name())))?;
        let dir = parent.join(self.cleaned_stem());

        if dir.exists() && !dir.is_dir() {
            return Err(Error::DestinationExists(dir.display().to_string()));
        }

        fsutil::create_dir_all(&dir)?;
        let target = dir.join(self.name());
        self.move_to(&target)?;
        Directory::open(&dir, &self.context)
    }

    /// Remove the file. The node is consumed.
    pub fn delete(self) -> Result<()> {
        self.ensure_exists()?;
        std::fs::remove_file(self.path())?;
        tracing::debug!("Deleted file: {:?}", self.path());
        Ok(())
    }
}

impl FileSystemNode for File {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut NodeMeta {
        &mut self.meta
    }

    fn context(&self) -> &Arc<NodeContext> {
        &self.context
    }

    fn kind(&self) -> NodeKind {
        NodeKind::File
    }

    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }

    fn category(&self) -> Result<Category> {
        Ok(self
            .context
            .classifier
            .classify(self.extension().unwrap_or(""), self.stem()))
    }

    fn reload(&mut self) -> Result<()> {
        *self = File::open(&self.meta.path, &self.context)?;
        Ok(())
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File: {}", self.path().display())?;
        writeln!(f, "Name: {}", self.name())?;
        writeln!(f, "Cleaned: {}", self.cleaned_name())?;
        writeln!(f, "Extension: {}", self.extension().unwrap_or("-"))?;
        writeln!(f, "Size: {}", humansize::format_size(self.size, humansize::BINARY))?;
        writeln!(
            f,
            "Last Modified: {}",
            self.formatted_modified("%Y-%m-%d %H:%M:%S")
        )?;
        match self.category() {
            Ok(category) => write!(f, "Type: {}", category),
            Err(_) => write!(f, "Type: ?"),
        }
    }
}

/// A directory.
#[derive(Debug, Clone)]
pub struct Directory {
    meta: NodeMeta,
    recursive: bool,
    // Recursive size, cleared on reload and on every mutation through this node.
    size_cache: Cell<Option<u64>>,
    context: Arc<NodeContext>,
}

impl Directory {
    /// Open an existing directory.
    pub fn open(path: &Path, context: &Arc<NodeContext>) -> Result<Self> {
        let (meta, _) = NodeMeta::load(path, context, NodeKind::Directory)?;
        Ok(Self {
            meta,
            recursive: false,
            size_cache: Cell::new(None),
            context: Arc::clone(context),
        })
    }

    /// Set the default traversal mode used by [`Directory::children`].
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    fn invalidate(&self) {
        self.size_cache.set(None);
    }

    /// Enumerate entries. Each call lists the filesystem again.
    ///
    /// Entries come in file-name order. Hidden entries (and everything below
    /// a hidden directory) are skipped unless `include_hidden` is set.
    pub fn iter(&self, recursive: bool, include_hidden: bool) -> Children {
        let walker = WalkDir::new(self.path())
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        let entries: Box<dyn Iterator<Item = walkdir::Result<DirEntry>>> = if include_hidden {
            Box::new(walker)
        } else {
            Box::new(walker.filter_entry(|e| e.depth() == 0 || !is_hidden_entry(e)))
        };

        Children {
            entries,
            context: Arc::clone(&self.context),
        }
    }

    /// Visible entries using this directory's traversal mode.
    pub fn children(&self) -> Children {
        self.iter(self.recursive, false)
    }

    /// Visible files.
    pub fn files(&self, recursive: bool) -> impl Iterator<Item = File> {
        self.iter(recursive, false).filter_map(Node::into_file)
    }

    /// Visible subdirectories.
    pub fn directories(&self, recursive: bool) -> impl Iterator<Item = Directory> {
        self.iter(recursive, false).filter_map(Node::into_directory)
    }

    /// Number of visible immediate entries.
    pub fn count(&self) -> usize {
        self.iter(false, false).count()
    }

    /// Number of visible immediate files.
    pub fn count_files(&self) -> usize {
        self.files(false).count()
    }

    /// Number of visible immediate subdirectories.
    pub fn count_dirs(&self) -> usize {
        self.directories(false).count()
    }

    /// Find an entry by name, hidden entries included.
    pub fn find(&self, name: &str, recursive: bool) -> Option<Node> {
        self.iter(recursive, true).find(|n| n.name_key() == name)
    }

    /// Whether an entry with this name exists, hidden entries included.
    pub fn contains(&self, name: &str, recursive: bool) -> bool {
        if !recursive {
            return self.path().join(name).exists();
        }
        WalkDir::new(self.path())
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy() == name)
    }

    /// Whether an entry named like `node` exists. Name-based, not path-based.
    pub fn contains_node(&self, node: &dyn FileSystemNode, recursive: bool) -> bool {
        self.contains(node.name_key(), recursive)
    }

    /// Create a new, empty subdirectory.
    pub fn create_subdirectory(&mut self, name: &str) -> Result<Directory> {
        self.ensure_exists()?;
        fsutil::validate_entry_name(name)?;
        let path = self.path().join(name);
        if path.exists() {
            return Err(Error::DestinationExists(path.display().to_string()));
        }
        std::fs::create_dir(&path)?;
        self.invalidate();
        Directory::open(&path, &self.context)
    }

    /// Move every immediate entry of `other` into this directory, then remove
    /// `other`. Returns the relocated nodes.
    ///
    /// Not atomic: on failure, entries moved so far stay moved and `other`
    /// is kept.
    pub fn merge(&mut self, other: Directory) -> Result<Vec<Node>> {
        self.ensure_exists()?;
        other.ensure_exists()?;
        if self.path().starts_with(other.path()) {
            return Err(Error::other(format!(
                "Cannot merge {} into its own descendant {}",
                other.path().display(),
                self.path().display()
            )));
        }

        self.invalidate();
        let mut moved = Vec::new();
        for mut node in other.iter(false, true).collect::<Vec<_>>() {
            let target = self.path().join(node.name());
            node.move_to(&target)?;
            moved.push(node);
        }

        std::fs::remove_dir(other.path())?;
        tracing::debug!(
            "Merged {} entries from {:?} into {:?}",
            moved.len(),
            other.path(),
            self.path()
        );
        Ok(moved)
    }

    /// Names present in both directories.
    pub fn intersect_contents(&self, other: &Directory) -> BTreeSet<String> {
        let mine = self.content_names();
        let theirs = other.content_names();
        mine.intersection(&theirs).cloned().collect()
    }

    /// Names present in either directory.
    pub fn union_contents(&self, other: &Directory) -> BTreeSet<String> {
        let mut names = self.content_names();
        names.extend(other.content_names());
        names
    }

    fn content_names(&self) -> BTreeSet<String> {
        self.children().map(|n| n.name().to_string()).collect()
    }

    /// Move every immediate entry up into the parent directory, optionally
    /// renaming each to its cleaned name, then remove this directory.
    ///
    /// Not atomic: on failure, entries moved so far stay moved. The
    /// directory is removed only once it is empty.
    pub fn unpack(self, clean_names: bool) -> Result<Vec<Node>> {
        self.ensure_exists()?;
        let parent = self
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::other(format!("Cannot unpack {}", self.name())))?;

        let mut moved = Vec::new();
        for mut node in self.iter(false, true).collect::<Vec<_>>() {
            let name = if clean_names && !node.is_hidden() {
                node.cleaned_name().to_string()
            } else {
                node.name().to_string()
            };
            node.move_to(&parent.join(&name))?;
            moved.push(node);
        }

        if fsutil::is_empty_dir(self.path())? {
            std::fs::remove_dir(self.path())?;
            tracing::debug!("Unpacked and removed {:?}", self.path());
        } else {
            tracing::warn!("{:?} is not empty after unpacking, keeping it", self.path());
        }

        Ok(moved)
    }

    /// Remove the directory. Non-empty directories need `recursive`.
    /// The node is consumed.
    pub fn delete(self, recursive: bool) -> Result<()> {
        self.ensure_exists()?;
        if recursive {
            std::fs::remove_dir_all(self.path())?;
        } else {
            if !fsutil::is_empty_dir(self.path())? {
                return Err(Error::DirectoryNotEmpty(self.path().display().to_string()));
            }
            std::fs::remove_dir(self.path())?;
        }
        tracing::debug!("Deleted directory: {:?}", self.path());
        Ok(())
    }
}

impl FileSystemNode for Directory {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut NodeMeta {
        &mut self.meta
    }

    fn context(&self) -> &Arc<NodeContext> {
        &self.context
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Directory
    }

    fn size(&self) -> Result<u64> {
        if let Some(size) = self.size_cache.get() {
            return Ok(size);
        }
        self.ensure_exists()?;
        let size = WalkDir::new(self.path())
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum();
        self.size_cache.set(Some(size));
        Ok(size)
    }

    /// Dominant category of all visible files below this directory.
    fn category(&self) -> Result<Category> {
        self.ensure_exists()?;
        let classifier = &self.context.classifier;
        Ok(crate::core::classifier::TypeClassifier::dominant(
            self.files(true)
                .map(|f| classifier.classify(f.extension().unwrap_or(""), f.stem())),
        ))
    }

    fn reload(&mut self) -> Result<()> {
        let recursive = self.recursive;
        *self = Directory::open(&self.meta.path, &self.context)?.with_recursive(recursive);
        Ok(())
    }

    fn move_to(&mut self, new_path: &Path) -> Result<()> {
        self.ensure_exists()?;
        let from = self.path().to_path_buf();
        if new_path.starts_with(&from) {
            return Err(Error::other(format!(
                "Cannot move {} into itself",
                from.display()
            )));
        }
        fsutil::move_path(&from, new_path)?;
        tracing::debug!("Moved: {:?} -> {:?}", from, new_path);
        self.meta.path = new_path.to_path_buf();
        self.reload()
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Directory: {}", self.path().display())?;
        writeln!(f, "Name: {}", self.name())?;
        writeln!(f, "Cleaned: {}", self.cleaned_name())?;
        match self.year() {
            Some(year) => writeln!(f, "Year: {}", year)?,
            None => writeln!(f, "Year: -")?,
        }
        match self.human_size() {
            Ok(size) => writeln!(f, "Size: {}", size)?,
            Err(_) => writeln!(f, "Size: ?")?,
        }
        writeln!(f, "Items: {}", self.count())?;
        writeln!(f, "  - Files: {}", self.count_files())?;
        writeln!(f, "  - Subdirectories: {}", self.count_dirs())?;
        writeln!(f, "Recursive: {}", self.recursive)?;
        writeln!(
            f,
            "Last Modified: {}",
            self.formatted_modified("%Y-%m-%d %H:%M:%S")
        )?;
        match self.category() {
            Ok(category) => write!(f, "Type: {}", category),
            Err(_) => write!(f, "Type: ?"),
        }
    }
}

/// Either a file or a directory.
#[derive(Debug, Clone)]
pub enum Node {
    File(File),
    Directory(Directory),
}

impl Node {
    /// Open a path as whichever kind it is.
    pub fn open(path: &Path, context: &Arc<NodeContext>) -> Result<Self> {
        fsutil::ensure_exists(path)?;
        let metadata = std::fs::metadata(path)?;
        if metadata.is_dir() {
            Ok(Node::Directory(Directory::open(path, context)?))
        } else if metadata.is_file() {
            Ok(Node::File(File::open(path, context)?))
        } else {
            Err(Error::other(format!(
                "Unsupported file type: {}",
                path.display()
            )))
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Node::File(_))
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory(_))
    }

    pub fn as_file(&self) -> Option<&File> {
        match self {
            Node::File(f) => Some(f),
            Node::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            Node::Directory(d) => Some(d),
            Node::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<File> {
        match self {
            Node::File(f) => Some(f),
            Node::Directory(_) => None,
        }
    }

    pub fn into_directory(self) -> Option<Directory> {
        match self {
            Node::Directory(d) => Some(d),
            Node::File(_) => None,
        }
    }

    /// Remove the entry. `recursive` only matters for directories.
    pub fn delete(self, recursive: bool) -> Result<()> {
        match self {
            Node::File(f) => f.delete(),
            Node::Directory(d) => d.delete(recursive),
        }
    }

    fn inner(&self) -> &dyn FileSystemNode {
        match self {
            Node::File(f) => f,
            Node::Directory(d) => d,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn FileSystemNode {
        match self {
            Node::File(f) => f,
            Node::Directory(d) => d,
        }
    }
}

impl FileSystemNode for Node {
    fn meta(&self) -> &NodeMeta {
        self.inner().meta()
    }

    fn meta_mut(&mut self) -> &mut NodeMeta {
        self.inner_mut().meta_mut()
    }

    fn context(&self) -> &Arc<NodeContext> {
        self.inner().context()
    }

    fn kind(&self) -> NodeKind {
        self.inner().kind()
    }

    fn size(&self) -> Result<u64> {
        self.inner().size()
    }

    fn category(&self) -> Result<Category> {
        self.inner().category()
    }

    fn reload(&mut self) -> Result<()> {
        self.inner_mut().reload()
    }

    fn move_to(&mut self, new_path: &Path) -> Result<()> {
        self.inner_mut().move_to(new_path)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::File(file) => file.fmt(f),
            Node::Directory(dir) => dir.fmt(f),
        }
    }
}

impl From<File> for Node {
    fn from(file: File) -> Self {
        Node::File(file)
    }
}

impl From<Directory> for Node {
    fn from(dir: Directory) -> Self {
        Node::Directory(dir)
    }
}

/// Lazy, restartable enumeration of a directory's entries.
///
/// Entries that vanish or cannot be read between listing and opening are
/// logged and skipped.
pub struct Children {
    entries: Box<dyn Iterator<Item = walkdir::Result<DirEntry>>>,
    context: Arc<NodeContext>,
}

impl Iterator for Children {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            match Node::open(entry.path(), &self.context) {
                Ok(node) => return Some(node),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                }
            }
        }
    }
}

fn is_hidden_entry(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(fsutil::is_hidden_name)
        .unwrap_or(false)
}
