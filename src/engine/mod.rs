// src/engine/mod.rs

//! Per-descriptor orchestration.
//!
//! This module ties together:
//! - the debounce/rebuild state machine
//! - the set of live watches for a descriptor
//! - the supervisor event loop that reacts to:
//!   - source path changes
//!   - descriptor file changes
//!   - rebuild completion
//!   - shutdown requests
//!
//! The pure state machine lives in [`controller`]; the async/IO shell is
//! implemented in [`supervisor`].

pub mod controller;
pub mod supervisor;
pub mod watch_set;

/// Identifies one installed watch within a supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Events flowing into a supervisor from its watches and rebuild task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Something changed under a watched source path.
    SourceChanged(WatchId),
    /// The descriptor file itself changed (edited, replaced or deleted).
    DescriptorChanged(WatchId),
    /// The in-flight rebuild finished, whatever its outcome.
    RebuildFinished,
    /// Stop supervising this descriptor.
    ShutdownRequested,
}

pub use controller::{ControllerCommand, ControllerEvent, RebuildController, RebuildState};
pub use supervisor::{DescriptorSupervisor, SupervisorDeps, SupervisorHandle};
pub use watch_set::WatchSet;
