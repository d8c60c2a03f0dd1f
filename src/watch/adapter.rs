// src/watch/adapter.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::watch::path_utils::display_relative;

/// Callback invoked for every change under a watched path. It carries no
/// payload: callers only learn that *something* changed.
pub type ChangeCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// A live watch on one path.
///
/// After `stop` returns, the callback passed to [`WatchBackend::watch`] is
/// never invoked again. Dropping the handle stops it as well.
pub trait PathWatch: Send {
    fn path(&self) -> &Path;
    fn stop(self: Box<Self>);
}

/// Factory for [`PathWatch`]es.
///
/// Production uses [`NotifyWatchBackend`]; tests install a backend whose
/// changes they trigger by hand.
pub trait WatchBackend: Send + Sync {
    fn watch(&self, path: &Path, on_change: ChangeCallback) -> Result<Box<dyn PathWatch>>;
}

/// Recursive, persistent watches backed by `notify`'s recommended watcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyWatchBackend;

impl WatchBackend for NotifyWatchBackend {
    fn watch(&self, path: &Path, on_change: ChangeCallback) -> Result<Box<dyn PathWatch>> {
        let watch = NotifyPathWatch::start(path, on_change)?;
        Ok(Box::new(watch))
    }
}

/// Handle for a single `notify` watcher.
///
/// `active` is held by the notify thread for the whole duration of a
/// callback and cleared by `stop`, so a stop cannot interleave with a
/// delivery in progress.
pub struct NotifyPathWatch {
    path: PathBuf,
    active: Arc<Mutex<bool>>,
    watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for NotifyPathWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyPathWatch")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl NotifyPathWatch {
    pub fn start(path: &Path, on_change: ChangeCallback) -> Result<Self> {
        let active = Arc::new(Mutex::new(true));

        // Closure called synchronously by notify whenever an event arrives.
        let mut watcher = RecommendedWatcher::new(
            {
                let active = Arc::clone(&active);
                let path = path.to_path_buf();
                move |res: notify::Result<Event>| {
                    let guard = match active.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    if !*guard {
                        return;
                    }
                    match res {
                        Ok(event) => {
                            debug!(watched = %path.display(), kind = ?event.kind, "change notification");
                            on_change();
                        }
                        Err(err) => {
                            warn!(watched = %path.display(), error = %err, "file watch error");
                        }
                    }
                }
            },
            Config::default(),
        )?;

        watcher.watch(path, RecursiveMode::Recursive)?;

        info!("* Watching {}", display_relative(path));

        Ok(Self {
            path: path.to_path_buf(),
            active,
            watcher: Some(watcher),
        })
    }

    fn release(&mut self) {
        match self.active.lock() {
            Ok(mut guard) => *guard = false,
            Err(poisoned) => *poisoned.into_inner() = false,
        }
        if self.watcher.take().is_some() {
            debug!(path = %self.path.display(), "watch released");
        }
    }
}

impl PathWatch for NotifyPathWatch {
    fn path(&self) -> &Path {
        &self.path
    }

    fn stop(mut self: Box<Self>) {
        self.release();
    }
}

impl Drop for NotifyPathWatch {
    fn drop(&mut self) {
        self.release();
    }
}
