use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use packwatch::errors::{PackwatchError, Result};
use packwatch::watch::{ChangeCallback, PathWatch, WatchBackend};

struct FakeWatch {
    path: PathBuf,
    callback: Arc<ChangeCallback>,
    active: Arc<AtomicBool>,
}

#[derive(Default)]
struct FakeState {
    watches: Vec<FakeWatch>,
    failing: HashSet<PathBuf>,
}

/// A watch backend driven by hand.
///
/// `touch(path)` behaves like a recursive watcher: it notifies every live
/// watch on `path` or on one of its ancestors. Released watches are kept
/// around so tests can replay a late delivery with `deliver_stale`.
#[derive(Clone, Default)]
pub struct FakeWatchBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeWatchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `watch(path)` fail from now on.
    pub fn fail_on(&self, path: impl AsRef<Path>) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(path.as_ref().to_path_buf());
    }

    /// Simulate a change at `path`; returns how many watches were notified.
    pub fn touch(&self, path: impl AsRef<Path>) -> usize {
        self.fire(path.as_ref(), true)
    }

    /// Invoke the callbacks of *released* watches covering `path`, as if a
    /// notification had been queued just before release.
    pub fn deliver_stale(&self, path: impl AsRef<Path>) -> usize {
        self.fire(path.as_ref(), false)
    }

    /// Paths with a live watch, in installation order.
    pub fn active_paths(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .unwrap()
            .watches
            .iter()
            .filter(|w| w.active.load(Ordering::SeqCst))
            .map(|w| w.path.clone())
            .collect()
    }

    pub fn is_watched(&self, path: impl AsRef<Path>) -> bool {
        self.active_paths().iter().any(|p| p == path.as_ref())
    }

    /// Total number of watches ever installed.
    pub fn installed_count(&self) -> usize {
        self.state.lock().unwrap().watches.len()
    }

    fn fire(&self, path: &Path, live: bool) -> usize {
        // Call outside the lock: callbacks may race with `watch` / `stop`.
        let callbacks: Vec<Arc<ChangeCallback>> = {
            let state = self.state.lock().unwrap();
            state
                .watches
                .iter()
                .filter(|w| w.active.load(Ordering::SeqCst) == live)
                .filter(|w| path.starts_with(&w.path))
                .map(|w| Arc::clone(&w.callback))
                .collect()
        };

        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }
}

impl WatchBackend for FakeWatchBackend {
    fn watch(&self, path: &Path, on_change: ChangeCallback) -> Result<Box<dyn PathWatch>> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(path) {
            return Err(PackwatchError::Other(anyhow::anyhow!(
                "fake watch failure for {}",
                path.display()
            )));
        }

        let active = Arc::new(AtomicBool::new(true));
        state.watches.push(FakeWatch {
            path: path.to_path_buf(),
            callback: Arc::new(on_change),
            active: Arc::clone(&active),
        });

        Ok(Box::new(FakePathWatch {
            path: path.to_path_buf(),
            active,
        }))
    }
}

struct FakePathWatch {
    path: PathBuf,
    active: Arc<AtomicBool>,
}

impl PathWatch for FakePathWatch {
    fn path(&self) -> &Path {
        &self.path
    }

    fn stop(self: Box<Self>) {
        self.active.store(false, Ordering::SeqCst);
    }
}
