use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::Instant;

use packwatch::errors::PackwatchError;
use packwatch::exec::{RebuildExecutor, RebuildFuture};

/// One observed rebuild invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildCall {
    pub descriptor: PathBuf,
    pub started_at: Instant,
    pub finished_at: Option<Instant>,
}

enum Completion {
    /// Complete after sleeping this long (zero = immediately).
    After(Duration),
    /// Complete when the test calls `complete_one`.
    Manual(Arc<Semaphore>),
    /// Fail as if the packer could not be spawned.
    SpawnFailure,
}

/// A fake executor that:
/// - records every rebuild it is asked to run
/// - tracks how many rebuilds overlap
/// - completes them after a fixed duration, on demand, or fails to start.
#[derive(Clone)]
pub struct RecordingExecutor {
    calls: Arc<Mutex<Vec<RebuildCall>>>,
    running: Arc<AtomicUsize>,
    max_running: Arc<AtomicUsize>,
    completion: Arc<Completion>,
}

impl RecordingExecutor {
    fn with_completion(completion: Completion) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicUsize::new(0)),
            max_running: Arc::new(AtomicUsize::new(0)),
            completion: Arc::new(completion),
        }
    }

    /// Rebuilds finish as soon as they start.
    pub fn instant() -> Self {
        Self::with_completion(Completion::After(Duration::ZERO))
    }

    /// Rebuilds take `duration` (use with paused Tokio time).
    pub fn taking(duration: Duration) -> Self {
        Self::with_completion(Completion::After(duration))
    }

    /// Rebuilds block until [`complete_one`](Self::complete_one) is called.
    pub fn manual() -> Self {
        Self::with_completion(Completion::Manual(Arc::new(Semaphore::new(0))))
    }

    /// Every rebuild fails before "running".
    pub fn failing() -> Self {
        Self::with_completion(Completion::SpawnFailure)
    }

    /// Let one blocked rebuild finish (manual mode only).
    pub fn complete_one(&self) {
        if let Completion::Manual(gate) = self.completion.as_ref() {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> Vec<RebuildCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn descriptors(&self) -> Vec<PathBuf> {
        self.calls().into_iter().map(|c| c.descriptor).collect()
    }

    /// Highest number of rebuilds that were ever in flight together.
    pub fn max_concurrent(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self, descriptor: &Path) -> packwatch::errors::Result<()> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RebuildCall {
                descriptor: descriptor.to_path_buf(),
                started_at: Instant::now(),
                finished_at: None,
            });
            calls.len() - 1
        };

        if let Completion::SpawnFailure = self.completion.as_ref() {
            return Err(PackwatchError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "fake packer missing",
            )));
        }

        let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now_running, Ordering::SeqCst);

        match self.completion.as_ref() {
            Completion::After(d) if d.is_zero() => {}
            Completion::After(d) => tokio::time::sleep(*d).await,
            Completion::Manual(gate) => {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
            Completion::SpawnFailure => {}
        }

        self.running.fetch_sub(1, Ordering::SeqCst);
        self.calls.lock().unwrap()[index].finished_at = Some(Instant::now());
        Ok(())
    }
}

impl RebuildExecutor for RecordingExecutor {
    fn rebuild<'a>(&'a self, descriptor: &'a Path) -> RebuildFuture<'a> {
        Box::pin(self.run(descriptor))
    }
}
