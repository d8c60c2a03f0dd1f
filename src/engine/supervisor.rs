// src/engine/supervisor.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::WatchConfig;
use crate::descriptor::load_descriptor;
use crate::errors::Result;
use crate::exec::{PackerExecutor, RebuildExecutor};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::{NotifyWatchBackend, WatchBackend};

use super::controller::{ControllerCommand, ControllerEvent, RebuildController};
use super::watch_set::WatchSet;
use super::SupervisorEvent;

/// Collaborators shared by every supervisor.
#[derive(Clone)]
pub struct SupervisorDeps {
    pub fs: Arc<dyn FileSystem>,
    pub watcher: Arc<dyn WatchBackend>,
    pub executor: Arc<dyn RebuildExecutor>,
    pub debounce: Duration,
}

impl fmt::Debug for SupervisorDeps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupervisorDeps")
            .field("fs", &self.fs)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl SupervisorDeps {
    /// Real filesystem, `notify` watches and the packer executable.
    pub fn from_config(config: &WatchConfig) -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            watcher: Arc::new(NotifyWatchBackend),
            executor: Arc::new(PackerExecutor::from_config(config)),
            debounce: config.debounce,
        }
    }
}

/// Handle to a running supervisor task.
#[derive(Debug)]
pub struct SupervisorHandle {
    descriptor: PathBuf,
    events_tx: mpsc::UnboundedSender<SupervisorEvent>,
    join: JoinHandle<()>,
}

impl SupervisorHandle {
    pub fn descriptor(&self) -> &Path {
        &self.descriptor
    }

    /// True once the supervisor has torn down for good (e.g. the descriptor
    /// was deleted).
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Ask the supervisor to release its watches and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.events_tx.send(SupervisorEvent::ShutdownRequested);
        if let Err(err) = self.join.await {
            error!(descriptor = %self.descriptor.display(), error = %err, "supervisor task failed");
        }
    }

    /// Wait for the supervisor to exit on its own.
    pub async fn finished(self) {
        if let Err(err) = self.join.await {
            error!(descriptor = %self.descriptor.display(), error = %err, "supervisor task failed");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Owns the watch set and rebuild state of one descriptor.
///
/// All events for the descriptor (watch notifications, the debounce
/// deadline, rebuild completion) are handled one at a time by a single
/// Tokio task, so the state needs no locking.
pub struct DescriptorSupervisor {
    descriptor: PathBuf,
    deps: SupervisorDeps,
    controller: RebuildController,
    watch_set: WatchSet,
    deadline: Option<Instant>,
    events_tx: mpsc::UnboundedSender<SupervisorEvent>,
    events_rx: mpsc::UnboundedReceiver<SupervisorEvent>,
}

impl fmt::Debug for DescriptorSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorSupervisor")
            .field("descriptor", &self.descriptor)
            .field("state", &self.controller.state())
            .field("watch_set", &self.watch_set)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl DescriptorSupervisor {
    /// Parse `descriptor`, install its watches and spawn the event loop.
    ///
    /// A descriptor that fails to parse or whose own file cannot be watched
    /// is reported here and nothing is spawned.
    pub fn start(descriptor: &Path, deps: SupervisorDeps) -> Result<SupervisorHandle> {
        let parsed = load_descriptor(deps.fs.as_ref(), descriptor)?;
        let descriptor = parsed.path.clone();

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut watch_set = WatchSet::new();
        watch_set.install_descriptor(deps.watcher.as_ref(), &descriptor, &events_tx)?;
        watch_set.reconcile_sources(deps.watcher.as_ref(), &parsed.sources, &events_tx);

        info!(
            descriptor = %descriptor.display(),
            sources = parsed.sources.len(),
            "supervising descriptor"
        );

        let supervisor = Self {
            descriptor: descriptor.clone(),
            deps,
            controller: RebuildController::new(),
            watch_set,
            deadline: None,
            events_tx: events_tx.clone(),
            events_rx,
        };

        let join = tokio::spawn(supervisor.run());

        Ok(SupervisorHandle {
            descriptor,
            events_tx,
            join,
        })
    }

    async fn run(mut self) {
        loop {
            let deadline = self.deadline;
            let timer = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };

            let flow = tokio::select! {
                biased;

                Some(event) = self.events_rx.recv() => self.handle_event(event),
                () = timer => {
                    self.deadline = None;
                    self.apply(ControllerEvent::TimerFired);
                    Flow::Continue
                }
            };

            if flow == Flow::Stop {
                break;
            }
        }

        debug!(descriptor = %self.descriptor.display(), "supervisor exited");
    }

    fn handle_event(&mut self, event: SupervisorEvent) -> Flow {
        match event {
            SupervisorEvent::SourceChanged(id) => {
                if self.watch_set.is_source(id) {
                    self.apply(ControllerEvent::ChangeSignal);
                } else {
                    debug!(id = id.0, "dropping change from released source watch");
                }
                Flow::Continue
            }
            SupervisorEvent::DescriptorChanged(id) => {
                if self.watch_set.is_descriptor(id) {
                    self.reload()
                } else {
                    debug!(id = id.0, "dropping change from released descriptor watch");
                    Flow::Continue
                }
            }
            SupervisorEvent::RebuildFinished => {
                self.apply(ControllerEvent::RebuildCompleted);
                Flow::Continue
            }
            SupervisorEvent::ShutdownRequested => {
                info!(descriptor = %self.descriptor.display(), "stopping watch");
                self.teardown();
                Flow::Stop
            }
        }
    }

    /// Re-establish the watch set after the descriptor file changed.
    fn reload(&mut self) -> Flow {
        self.watch_set.release_descriptor();

        if !self.deps.fs.exists(&self.descriptor) {
            info!(descriptor = %self.descriptor.display(), "descriptor removed; watch torn down");
            self.teardown();
            return Flow::Stop;
        }

        if let Err(err) = self.watch_set.install_descriptor(
            self.deps.watcher.as_ref(),
            &self.descriptor,
            &self.events_tx,
        ) {
            error!(
                descriptor = %self.descriptor.display(),
                error = %err,
                "could not re-watch descriptor; watch torn down"
            );
            self.teardown();
            return Flow::Stop;
        }

        match load_descriptor(self.deps.fs.as_ref(), &self.descriptor) {
            Ok(parsed) => {
                self.watch_set.reconcile_sources(
                    self.deps.watcher.as_ref(),
                    &parsed.sources,
                    &self.events_tx,
                );
                debug!(
                    descriptor = %self.descriptor.display(),
                    sources = parsed.sources.len(),
                    "descriptor reloaded"
                );
            }
            Err(err) => {
                // Keep only the descriptor watch so the next edit retries.
                error!(
                    descriptor = %self.descriptor.display(),
                    error = %err,
                    "descriptor became invalid; source watches released"
                );
                self.watch_set.release_sources();
            }
        }

        Flow::Continue
    }

    fn teardown(&mut self) {
        self.watch_set.release_all();
        let commands = self.controller.shutdown();
        self.run_commands(commands);
    }

    fn apply(&mut self, event: ControllerEvent) {
        let commands = self.controller.step(event);
        self.run_commands(commands);
    }

    fn run_commands(&mut self, commands: Vec<ControllerCommand>) {
        for command in commands {
            match command {
                ControllerCommand::ArmTimer => {
                    self.deadline = Some(Instant::now() + self.deps.debounce);
                }
                ControllerCommand::CancelTimer => {
                    self.deadline = None;
                }
                ControllerCommand::StartRebuild => self.spawn_rebuild(),
            }
        }
    }

    fn spawn_rebuild(&self) {
        let executor = Arc::clone(&self.deps.executor);
        let descriptor = self.descriptor.clone();
        let events_tx = self.events_tx.clone();

        tokio::spawn(async move {
            if let Err(err) = executor.rebuild(&descriptor).await {
                error!(descriptor = %descriptor.display(), error = %err, "rebuild failed to run");
            }
            // Fails once the supervisor is gone, which is exactly the no-op
            // a torn-down descriptor needs.
            let _ = events_tx.send(SupervisorEvent::RebuildFinished);
        });
    }
}
