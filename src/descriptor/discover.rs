// src/descriptor/discover.rs

use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::FileSystem;

/// Pattern (relative to the search root) that descriptor files must match.
pub const DESCRIPTOR_GLOB: &str = "**/*.tps";

fn descriptor_globset() -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    builder.add(
        Glob::new(DESCRIPTOR_GLOB)
            .with_context(|| format!("invalid descriptor glob '{DESCRIPTOR_GLOB}'"))?,
    );
    Ok(builder
        .build()
        .context("building descriptor globset")?)
}

/// Recursively collect every `*.tps` file under `root`.
///
/// Symlinked directories below `root` are not descended into, and
/// subdirectories that cannot be listed are skipped with a warning. Only a
/// failure to list `root` itself is an error. Returned paths are absolute,
/// sorted and unique so startup order is stable.
pub fn discover_descriptors(fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
    let root = std::path::absolute(root)?;
    let globs = descriptor_globset()?;

    let mut found = Vec::new();
    let mut stack = Vec::new();

    for path in fs.read_dir(&root)? {
        visit(fs, &globs, &root, path, &mut stack, &mut found);
    }

    while let Some(dir) = stack.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "skipping unreadable directory");
                continue;
            }
        };
        for path in entries {
            visit(fs, &globs, &root, path, &mut stack, &mut found);
        }
    }

    found.sort();
    found.dedup();
    Ok(found)
}

fn visit(
    fs: &dyn FileSystem,
    globs: &GlobSet,
    root: &Path,
    path: PathBuf,
    stack: &mut Vec<PathBuf>,
    found: &mut Vec<PathBuf>,
) {
    if fs.is_dir(&path) {
        if fs.is_symlink(&path) {
            debug!(path = %path.display(), "not following symlinked directory");
        } else {
            stack.push(path);
        }
    } else if fs.is_file(&path) {
        if let Ok(rel) = path.strip_prefix(root) {
            let rel_str = rel.to_string_lossy().replace('\\', "/");
            if globs.is_match(&rel_str) {
                debug!(path = %path.display(), "found descriptor");
                found.push(path);
            }
        }
    }
}
