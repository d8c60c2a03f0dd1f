#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use packwatch::engine::{DescriptorSupervisor, SupervisorDeps, SupervisorHandle};
use packwatch::fs::mock::MockFileSystem;
use packwatch_test_utils::builders::DescriptorBuilder;
use packwatch_test_utils::fake_executor::RecordingExecutor;
use packwatch_test_utils::fake_watch::FakeWatchBackend;

pub const DEBOUNCE: Duration = Duration::from_millis(1000);

/// Everything a supervisor test needs, sharing state with the code under
/// test so the test can edit files and fire watches while it runs.
pub struct Harness {
    pub fs: MockFileSystem,
    pub watcher: FakeWatchBackend,
    pub executor: RecordingExecutor,
}

impl Harness {
    pub fn new(executor: RecordingExecutor) -> Self {
        packwatch_test_utils::init_tracing();
        Self {
            fs: MockFileSystem::new(),
            watcher: FakeWatchBackend::new(),
            executor,
        }
    }

    pub fn deps(&self) -> SupervisorDeps {
        SupervisorDeps {
            fs: Arc::new(self.fs.clone()),
            watcher: Arc::new(self.watcher.clone()),
            executor: Arc::new(self.executor.clone()),
            debounce: DEBOUNCE,
        }
    }

    /// Write a valid descriptor declaring `files` (relative to its directory).
    pub fn write_descriptor<'a>(&self, path: &str, files: impl IntoIterator<Item = &'a str>) {
        self.fs
            .add_file(path, DescriptorBuilder::new().files(files).build());
    }

    pub fn start(&self, path: &str) -> SupervisorHandle {
        DescriptorSupervisor::start(Path::new(path), self.deps())
            .expect("supervisor should start")
    }
}

/// Let the supervisor drain its queue without reaching any pending deadline.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Advance paused time by `ms` and let woken tasks run.
pub async fn advance_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    settle().await;
}
