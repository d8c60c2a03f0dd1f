// src/engine/watch_set.rs

//! The live watches owned by one descriptor's supervisor.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{SupervisorEvent, WatchId};
use crate::errors::Result;
use crate::watch::{PathWatch, WatchBackend};

struct InstalledWatch {
    id: WatchId,
    path: PathBuf,
    handle: Box<dyn PathWatch>,
}

/// One watch on the descriptor file plus one per declared source path.
///
/// Every installed watch gets a fresh [`WatchId`]. Events carry the id of
/// the watch that produced them, and the supervisor drops any event whose id
/// is no longer part of the set, so deliveries already queued when a watch
/// is released never act on it.
#[derive(Default)]
pub struct WatchSet {
    next_id: u64,
    descriptor: Option<InstalledWatch>,
    /// Source watches in declaration order.
    sources: Vec<InstalledWatch>,
}

impl fmt::Debug for WatchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSet")
            .field("descriptor", &self.descriptor.as_ref().map(|w| &w.path))
            .field("sources", &self.source_paths())
            .finish()
    }
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_descriptor(&self, id: WatchId) -> bool {
        self.descriptor.as_ref().is_some_and(|w| w.id == id)
    }

    pub fn is_source(&self, id: WatchId) -> bool {
        self.sources.iter().any(|w| w.id == id)
    }

    pub fn source_paths(&self) -> Vec<&Path> {
        self.sources.iter().map(|w| w.path.as_path()).collect()
    }

    /// Watch the descriptor file itself, replacing any previous watch on it.
    pub fn install_descriptor(
        &mut self,
        backend: &dyn WatchBackend,
        path: &Path,
        events: &mpsc::UnboundedSender<SupervisorEvent>,
    ) -> Result<()> {
        self.release_descriptor();
        let id = self.allocate_id();
        let tx = events.clone();
        let handle = backend.watch(
            path,
            Box::new(move || {
                let _ = tx.send(SupervisorEvent::DescriptorChanged(id));
            }),
        )?;
        self.descriptor = Some(InstalledWatch {
            id,
            path: path.to_path_buf(),
            handle,
        });
        Ok(())
    }

    pub fn release_descriptor(&mut self) {
        if let Some(watch) = self.descriptor.take() {
            release(watch);
        }
    }

    /// Make the source watches match `declared`.
    ///
    /// Watches for paths that are still declared are kept as they are,
    /// watches for paths no longer declared are released, and new paths get
    /// a fresh watch. A path that cannot be watched is logged and skipped.
    pub fn reconcile_sources(
        &mut self,
        backend: &dyn WatchBackend,
        declared: &[PathBuf],
        events: &mpsc::UnboundedSender<SupervisorEvent>,
    ) {
        let wanted: HashSet<&Path> = declared.iter().map(PathBuf::as_path).collect();

        let (mut kept, stale): (Vec<_>, Vec<_>) = std::mem::take(&mut self.sources)
            .into_iter()
            .partition(|w| wanted.contains(w.path.as_path()));
        stale.into_iter().for_each(release);

        let mut sources = Vec::with_capacity(declared.len());
        let mut seen: HashSet<&Path> = HashSet::new();

        for path in declared {
            if !seen.insert(path.as_path()) {
                continue;
            }

            if let Some(pos) = kept.iter().position(|w| w.path == *path) {
                sources.push(kept.swap_remove(pos));
                continue;
            }

            let id = self.allocate_id();
            let tx = events.clone();
            match backend.watch(
                path,
                Box::new(move || {
                    let _ = tx.send(SupervisorEvent::SourceChanged(id));
                }),
            ) {
                Ok(handle) => sources.push(InstalledWatch {
                    id,
                    path: path.clone(),
                    handle,
                }),
                Err(err) => warn!(
                    path = %path.display(),
                    error = %err,
                    "could not watch source path; skipping"
                ),
            }
        }

        self.sources = sources;
    }

    pub fn release_sources(&mut self) {
        std::mem::take(&mut self.sources).into_iter().for_each(release);
    }

    pub fn release_all(&mut self) {
        self.release_descriptor();
        self.release_sources();
    }

    fn allocate_id(&mut self) -> WatchId {
        self.next_id += 1;
        WatchId(self.next_id)
    }
}

impl Drop for WatchSet {
    fn drop(&mut self) {
        self.release_all();
    }
}

fn release(watch: InstalledWatch) {
    debug!(id = watch.id.0, path = %watch.path.display(), "releasing watch");
    watch.handle.stop();
}
