//! Integration tests for the node model.
//!
//! Tests cover:
//! - Directory enumeration, search and counting
//! - Category aggregation for directories
//! - Unpack, pack, merge and delete, including failures partway through
//! - Rename and clean_name reload behavior

use file_sorter::core::context::NodeContext;
use file_sorter::core::node::{Directory, File, FileSystemNode, Node};
use file_sorter::models::category::Category;
use file_sorter::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn ctx() -> Arc<NodeContext> {
    NodeContext::with_defaults().unwrap()
}

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "content").unwrap();
}

#[test]
fn test_directory_counts() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("a.mkv"));
    touch(&temp_dir.path().join("b.srt"));
    touch(&temp_dir.path().join(".hidden"));
    touch(&temp_dir.path().join("sub").join("c.mkv"));

    let dir = Directory::open(temp_dir.path(), &ctx()).unwrap();
    assert_eq!(dir.count(), 3);
    assert_eq!(dir.count_files(), 2);
    assert_eq!(dir.count_dirs(), 1);
    assert_eq!(dir.files(true).count(), 3);
    assert_eq!(dir.directories(true).count(), 1);
}

#[test]
fn test_children_follow_recursive_flag() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("a.txt"));
    touch(&temp_dir.path().join("sub").join("b.txt"));

    let flat = Directory::open(temp_dir.path(), &ctx()).unwrap();
    assert_eq!(flat.children().count(), 2);

    let deep = flat.clone().with_recursive(true);
    assert!(deep.recursive());
    assert_eq!(deep.children().count(), 3);
}

#[test]
fn test_find_returns_node() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("season 1").join("ep.mkv"));

    let dir = Directory::open(temp_dir.path(), &ctx()).unwrap();
    assert!(dir.find("ep.mkv", false).is_none());

    let found = dir.find("ep.mkv", true).unwrap();
    assert!(found.is_file());
    assert_eq!(found.name(), "ep.mkv");

    let sub = dir.find("season 1", false).unwrap();
    assert!(sub.is_dir());
}

#[test]
fn test_contains_node_is_name_based() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("a").join("same.txt"));
    touch(&temp_dir.path().join("b").join("same.txt"));

    let a = Directory::open(&temp_dir.path().join("a"), &ctx()).unwrap();
    let other = File::open(&temp_dir.path().join("b").join("same.txt"), &ctx()).unwrap();
    assert!(a.contains_node(&other, false));
}

#[test]
fn test_directory_category_majority() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("a.mkv"));
    touch(&temp_dir.path().join("b.mkv"));
    touch(&temp_dir.path().join("c.S01E01.mkv"));
    touch(&temp_dir.path().join("cover.jpg"));
    touch(&temp_dir.path().join("notes.txt"));

    let dir = Directory::open(temp_dir.path(), &ctx()).unwrap();
    assert_eq!(dir.category().unwrap(), Category::Movie);
}

#[test]
fn test_directory_category_tie_first_seen() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("a.S01E01.mkv"));
    touch(&temp_dir.path().join("b.mkv"));

    let dir = Directory::open(temp_dir.path(), &ctx()).unwrap();
    assert_eq!(dir.category().unwrap(), Category::TvShow);
}

#[test]
fn test_directory_category_only_noise() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("cover.jpg"));
    touch(&temp_dir.path().join("readme.txt"));

    let dir = Directory::open(temp_dir.path(), &ctx()).unwrap();
    assert_eq!(dir.category().unwrap(), Category::Other);
}

#[test]
fn test_directory_year_prefers_parenthesized() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("2001 A Space Odyssey (1968)");
    fs::create_dir(&path).unwrap();

    let dir = Directory::open(&path, &ctx()).unwrap();
    assert_eq!(dir.year(), Some(1968));
}

#[test]
fn test_unpack_moves_children_up() {
    let temp_dir = TempDir::new().unwrap();
    let inner = temp_dir.path().join("Pack.Name");
    touch(&inner.join("Some.Movie.2010.1080p.mkv"));
    touch(&inner.join("extras").join("making.of.mkv"));

    let dir = Directory::open(&inner, &ctx()).unwrap();
    let moved = dir.unpack(true).unwrap();

    assert_eq!(moved.len(), 2);
    assert!(!inner.exists());
    assert!(temp_dir.path().join("some movie 2010.mkv").exists());
    assert!(temp_dir.path().join("extras").join("making.of.mkv").exists());
}

#[test]
fn test_unpack_keeps_names_without_cleaning() {
    let temp_dir = TempDir::new().unwrap();
    let inner = temp_dir.path().join("folder");
    touch(&inner.join("Raw.Name.720p.mkv"));

    Directory::open(&inner, &ctx())
        .unwrap()
        .unpack(false)
        .unwrap();
    assert!(temp_dir.path().join("Raw.Name.720p.mkv").exists());
    assert!(!inner.exists());
}

#[test]
fn test_pack_file_into_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("Heat.1995.720p.mkv");
    touch(&path);

    let mut file = File::open(&path, &ctx()).unwrap();
    let dir = file.pack().unwrap();

    assert_eq!(dir.name(), "heat 1995");
    assert!(dir.path().join("Heat.1995.720p.mkv").exists());
    assert_eq!(file.parent(), Some(dir.path()));
    assert!(!path.exists());
}

#[test]
fn test_pack_without_extension_conflicts() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("plain");
    touch(&path);

    let mut file = File::open(&path, &ctx()).unwrap();
    assert!(matches!(file.pack(), Err(Error::DestinationExists(_))));
    assert!(path.exists());
}

#[test]
fn test_merge_directories() {
    let temp_dir = TempDir::new().unwrap();
    let target_path = temp_dir.path().join("target");
    let source_path = temp_dir.path().join("source");
    touch(&target_path.join("a.txt"));
    touch(&source_path.join("b.txt"));
    touch(&source_path.join("nested").join("c.txt"));

    let mut target = Directory::open(&target_path, &ctx()).unwrap();
    let source = Directory::open(&source_path, &ctx()).unwrap();

    assert!(target.intersect_contents(&source).is_empty());
    let union = target.union_contents(&source);
    assert_eq!(union.len(), 3);

    let moved = target.merge(source).unwrap();
    assert_eq!(moved.len(), 2);
    assert!(!source_path.exists());
    assert!(target_path.join("b.txt").exists());
    assert!(target_path.join("nested").join("c.txt").exists());
    assert_eq!(target.count(), 3);
}

#[test]
fn test_unpack_stops_at_occupied_directory() {
    let temp_dir = TempDir::new().unwrap();
    let parent = temp_dir.path();
    let folder = parent.join("folder");
    touch(&folder.join("a.txt"));
    touch(&folder.join("z_dir").join("inner.txt"));
    touch(&parent.join("z_dir").join("keep.txt"));

    let dir = Directory::open(&folder, &ctx()).unwrap();
    assert!(matches!(dir.unpack(false), Err(Error::MoveFailed { .. })));

    // Entries moved before the failure stay moved.
    assert!(parent.join("a.txt").exists());
    assert!(!folder.join("a.txt").exists());
    assert!(folder.join("z_dir").join("inner.txt").exists());
    assert!(parent.join("z_dir").join("keep.txt").exists());
    assert!(!parent.join("z_dir").join("inner.txt").exists());
}

#[test]
fn test_merge_stops_at_occupied_directory() {
    let temp_dir = TempDir::new().unwrap();
    let target_path = temp_dir.path().join("target");
    let source_path = temp_dir.path().join("source");
    touch(&target_path.join("z_dir").join("keep.txt"));
    touch(&source_path.join("a.txt"));
    touch(&source_path.join("z_dir").join("inner.txt"));

    let mut target = Directory::open(&target_path, &ctx()).unwrap();
    let source = Directory::open(&source_path, &ctx()).unwrap();
    assert!(matches!(
        target.merge(source),
        Err(Error::MoveFailed { .. })
    ));

    assert!(target_path.join("a.txt").exists());
    assert!(source_path.exists());
    assert!(!source_path.join("a.txt").exists());
    assert!(source_path.join("z_dir").join("inner.txt").exists());
    assert!(target_path.join("z_dir").join("keep.txt").exists());
    // The reopened directory sees the partial merge.
    assert_eq!(
        Directory::open(&target_path, &ctx()).unwrap().count_files(),
        1
    );
}

#[test]
fn test_intersect_contents() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("x").join("shared.txt"));
    touch(&temp_dir.path().join("x").join("only_x.txt"));
    touch(&temp_dir.path().join("y").join("shared.txt"));

    let x = Directory::open(&temp_dir.path().join("x"), &ctx()).unwrap();
    let y = Directory::open(&temp_dir.path().join("y"), &ctx()).unwrap();

    let shared: Vec<_> = x.intersect_contents(&y).into_iter().collect();
    assert_eq!(shared, vec!["shared.txt".to_string()]);
}

#[test]
fn test_create_subdirectory() {
    let temp_dir = TempDir::new().unwrap();
    let mut dir = Directory::open(temp_dir.path(), &ctx()).unwrap();

    let sub = dir.create_subdirectory("Season 1").unwrap();
    assert!(sub.path().is_dir());
    assert_eq!(sub.name(), "Season 1");
    assert!(matches!(
        dir.create_subdirectory("Season 1"),
        Err(Error::DestinationExists(_))
    ));
    assert!(dir.create_subdirectory("a/b").is_err());
}

#[test]
fn test_delete_directory_requires_recursive() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("full");
    touch(&path.join("a.txt"));

    let dir = Directory::open(&path, &ctx()).unwrap();
    assert!(matches!(
        dir.clone().delete(false),
        Err(Error::DirectoryNotEmpty(_))
    ));
    assert!(path.exists());

    dir.delete(true).unwrap();
    assert!(!path.exists());
}

#[test]
fn test_deleted_node_operations_fail() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("gone.txt");
    touch(&path);

    let file = File::open(&path, &ctx()).unwrap();
    let mut stale = file.clone();
    file.delete().unwrap();

    assert!(!stale.exists());
    assert!(stale.rename("other.txt").unwrap_err().is_not_found());
    assert!(stale.clone().delete().unwrap_err().is_not_found());
}

#[test]
fn test_rename_and_clean_name() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("Some.Show.S01E02.HDTV.x264-GRP.mkv");
    touch(&path);

    let mut node = Node::open(&path, &ctx()).unwrap();
    node.clean_name().unwrap();
    assert_eq!(node.name(), "some show s01e02.mkv");
    assert!(temp_dir.path().join("some show s01e02.mkv").exists());

    // Already clean: nothing to do.
    node.clean_name().unwrap();
    assert_eq!(node.name(), "some show s01e02.mkv");

    node.rename("final.mkv").unwrap();
    assert_eq!(node.stem(), "final");
    assert!(temp_dir.path().join("final.mkv").exists());
}

#[test]
fn test_copy_to() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("a.txt");
    touch(&path);

    let file = File::open(&path, &ctx()).unwrap();
    let copy = file.copy_to(&temp_dir.path().join("backup").join("a.txt")).unwrap();

    assert!(path.exists());
    assert_eq!(copy.size().unwrap(), file.size().unwrap());
    assert!(!copy.same_entry(&file));
    assert!(copy.same_name(&file));
}

#[test]
fn test_display_describes_node() {
    let temp_dir = TempDir::new().unwrap();
    touch(&temp_dir.path().join("a.mkv"));

    let dir = Directory::open(temp_dir.path(), &ctx()).unwrap();
    let text = dir.to_string();
    assert!(text.contains("Items: 1"));
    assert!(text.contains("Type: movie"));

    let file = File::open(&temp_dir.path().join("a.mkv"), &ctx()).unwrap();
    let text = file.to_string();
    assert!(text.contains("Extension: mkv"));
    assert!(text.contains("Size: 7 B"));
}
