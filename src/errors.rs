// src/errors.rs

//! Crate-wide error type and aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackwatchError {
    /// Descriptor content is not well-formed XML.
    #[error("Descriptor parse error: {0}")]
    Parse(String),

    /// Descriptor is well-formed but does not follow the expected schema.
    #[error("Descriptor schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not find TexturePacker executable (looked in: {})", display_paths(.0))]
    PackerNotFound(Vec<PathBuf>),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PackwatchError>;
