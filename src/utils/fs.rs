//! File system utilities.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Check that a path exists.
pub fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::PathNotFound(path.display().to_string()));
    }
    Ok(())
}

/// Create a directory and all parent directories.
pub fn create_dir_all(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Move a file or directory, creating the destination's parents.
///
/// This is a single rename. Files crossing a filesystem boundary fall back to
/// copy + delete; directories crossing one fail with `MoveFailed`.
pub fn move_path(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    match std::fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices && from.is_file() => {
            tracing::debug!("Cross-filesystem move detected, using copy+delete");
            std::fs::copy(from, to).map_err(|source| Error::MoveFailed {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source,
            })?;
            std::fs::remove_file(from)?;
            Ok(())
        }
        Err(source) => Err(Error::MoveFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        }),
    }
}

/// Whether a directory has no entries at all (hidden ones included).
pub fn is_empty_dir(path: &Path) -> Result<bool> {
    Ok(std::fs::read_dir(path)?.next().is_none())
}

/// Get file extension in lowercase.
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Whether a file name is hidden (starts with a dot).
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Check that a single path component is usable as an entry name.
pub fn validate_entry_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." || name.contains(&['/', '\\'][..]) {
        return Err(Error::other(format!("Invalid entry name: '{}'", name)));
    }
    Ok(())
}

/// First free path of the form `stem (n).ext` next to `path`.
///
/// Returns `path` itself when nothing exists there yet.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    // Directories keep dots in their name, so only split real file extensions.
    let (stem, ext) = if path.is_dir() {
        (
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            String::new(),
        )
    } else {
        (stem, ext)
    };

    let mut n = 1u32;
    loop {
        let candidate = parent.join(format!("{} ({}){}", stem, n, ext));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
