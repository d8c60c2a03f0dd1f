// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

/// Render `path` relative to the current working directory, for log lines.
///
/// Falls back to the path as given when the working directory is unknown.
pub fn display_relative(path: &Path) -> String {
    match std::env::current_dir() {
        Ok(cwd) => relative_to(&cwd, path).to_string_lossy().into_owned(),
        Err(_) => path.display().to_string(),
    }
}

/// Express `path` relative to `base`, walking up with `..` when needed.
///
/// Only absolute inputs are related; relative paths are returned unchanged.
pub fn relative_to<'a>(base: &Path, path: &'a Path) -> Cow<'a, Path> {
    if !base.is_absolute() || !path.is_absolute() {
        return Cow::Borrowed(path);
    }

    // Fast path: path already lives under base.
    if let Ok(rel) = path.strip_prefix(base) {
        return if rel.as_os_str().is_empty() {
            Cow::Owned(PathBuf::from("."))
        } else {
            Cow::Borrowed(rel)
        };
    }

    let base_parts: Vec<Component<'_>> = base.components().collect();
    let path_parts: Vec<Component<'_>> = path.components().collect();

    // Different prefixes (e.g. Windows drives) cannot be related.
    if base_parts.first() != path_parts.first() {
        return Cow::Borrowed(path);
    }

    let common = base_parts
        .iter()
        .zip(path_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &path_parts[common..] {
        rel.push(part);
    }
    Cow::Owned(rel)
}
