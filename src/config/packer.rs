// src/config/packer.rs

//! Locating the TexturePacker executable.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::errors::{PackwatchError, Result};

/// Environment variable that can point at the packer executable.
pub const PACKER_ENV_VAR: &str = "PACKWATCH_PACKER";

/// Standard install locations, tried after any explicit override.
pub const KNOWN_PACKER_PATHS: &[&str] = &[
    "/usr/local/bin/TexturePacker",
    "/Applications/TexturePacker.app/Contents/MacOS/TexturePacker",
];

/// Return the first existing candidate out of: `explicit`, `$PACKWATCH_PACKER`,
/// then [`KNOWN_PACKER_PATHS`].
pub fn locate_packer(explicit: Option<&Path>) -> Result<PathBuf> {
    let env = std::env::var_os(PACKER_ENV_VAR).map(PathBuf::from);
    locate_packer_in(packer_candidates(explicit, env))
}

/// Candidate list in lookup order.
pub fn packer_candidates(explicit: Option<&Path>, env: Option<PathBuf>) -> Vec<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(env.filter(|p| !p.as_os_str().is_empty()))
        .chain(KNOWN_PACKER_PATHS.iter().map(PathBuf::from))
        .collect()
}

/// Pick the first usable candidate, or fail listing everything tried.
///
/// Bare program names (e.g. `--packer TexturePacker`) are looked up on
/// `$PATH`.
pub fn locate_packer_in(candidates: Vec<PathBuf>) -> Result<PathBuf> {
    locate_packer_on(candidates, std::env::var_os("PATH"))
}

/// Like [`locate_packer_in`], resolving bare names against `search_path`.
pub fn locate_packer_on(
    candidates: Vec<PathBuf>,
    search_path: Option<OsString>,
) -> Result<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    for candidate in &candidates {
        if candidate.is_file() {
            debug!(packer = %candidate.display(), "using packer executable");
            return Ok(candidate.clone());
        }
        if is_bare_name(candidate) {
            if let Ok(found) = which::which_in(candidate, search_path.as_ref(), &cwd) {
                debug!(
                    packer = %found.display(),
                    name = %candidate.display(),
                    "using packer from PATH"
                );
                return Ok(found);
            }
        }
    }
    Err(PackwatchError::PackerNotFound(candidates))
}

fn is_bare_name(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
