// src/descriptor/mod.rs

//! Project descriptors (`.tps` files).
//!
//! - [`xml`] builds a small element tree with `quick-xml`.
//! - [`parser`] validates the tree against the descriptor schema and
//!   extracts the declared source paths.
//! - [`discover`] finds descriptors under a search root.

pub mod discover;
pub mod parser;
pub mod xml;

use std::path::{Path, PathBuf};

use crate::errors::{PackwatchError, Result};
use crate::fs::FileSystem;

pub use discover::{discover_descriptors, DESCRIPTOR_GLOB};
pub use parser::{parse_descriptor, parse_source_paths, ParsedDescriptor, SUPPORTED_VERSION};

/// A loaded descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Absolute path of the descriptor file.
    pub path: PathBuf,
    pub version: Option<String>,
    /// Declared source paths, absolute, in document order.
    pub sources: Vec<PathBuf>,
}

/// Read and parse the descriptor at `path`.
///
/// `path` is made absolute against the current directory first, so source
/// paths always come out absolute.
pub fn load_descriptor(fs: &dyn FileSystem, path: &Path) -> Result<Descriptor> {
    let path = std::path::absolute(path)?;
    let contents = fs.read_to_string(&path)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("/"));

    let ParsedDescriptor { version, sources } = parse_descriptor(&contents, dir)
        .map_err(|e| with_descriptor_context(e, &path))?;

    Ok(Descriptor {
        path,
        version,
        sources,
    })
}

fn with_descriptor_context(err: PackwatchError, path: &Path) -> PackwatchError {
    match err {
        PackwatchError::Parse(msg) => PackwatchError::Parse(format!("{}: {msg}", path.display())),
        PackwatchError::Schema(msg) => PackwatchError::Schema(format!("{}: {msg}", path.display())),
        other => other,
    }
}
