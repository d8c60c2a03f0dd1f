// src/exec/backend.rs

//! Pluggable rebuild executor abstraction.
//!
//! Supervisors talk to a `RebuildExecutor` instead of spawning processes
//! themselves. Production uses [`PackerExecutor`](super::PackerExecutor);
//! tests swap in an executor that records calls and decides when each
//! rebuild completes.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use crate::errors::Result;

/// Future returned by [`RebuildExecutor::rebuild`].
pub type RebuildFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Runs the external build for one descriptor.
pub trait RebuildExecutor: Send + Sync {
    /// Rebuild `descriptor`; the future resolves once the build has exited.
    ///
    /// The build's own exit status is not part of the result: `Ok(())` means
    /// it ran to completion, `Err` means it could not be run at all.
    fn rebuild<'a>(&'a self, descriptor: &'a Path) -> RebuildFuture<'a>;
}
