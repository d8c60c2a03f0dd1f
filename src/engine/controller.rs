// src/engine/controller.rs

//! Pure debounce/rebuild state machine for one descriptor.
//!
//! The controller consumes [`ControllerEvent`]s and returns the
//! [`ControllerCommand`]s the async shell (`engine::supervisor`) must carry
//! out: arming or cancelling the debounce timer and starting a rebuild. It
//! has no channels, no Tokio types and no clock, so every transition can be
//! tested synchronously.
//!
//! ```text
//! Idle ──change──▶ Scheduled ──timer──▶ Running ──done──▶ Idle
//!                  (change re-arms)      │    ▲
//!                                     change  done (starts the owed rebuild)
//!                                        ▼    │
//!                                  RunningWithPending (change: stays)
//! ```

use tracing::debug;

/// Where the descriptor is in its debounce/rebuild cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebuildState {
    /// Nothing requested.
    #[default]
    Idle,
    /// Debounce timer armed; a rebuild starts when it fires.
    Scheduled,
    /// A rebuild is executing.
    Running,
    /// A rebuild is executing and another one is owed right after it.
    RunningWithPending,
}

impl RebuildState {
    pub fn is_running(self) -> bool {
        matches!(self, RebuildState::Running | RebuildState::RunningWithPending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A watched source path changed.
    ChangeSignal,
    /// The debounce timer elapsed.
    TimerFired,
    /// The executor finished the in-flight rebuild.
    RebuildCompleted,
}

/// Side effect requested by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCommand {
    /// (Re)start the debounce timer from now.
    ArmTimer,
    /// Drop any armed debounce timer.
    CancelTimer,
    /// Invoke the rebuild executor.
    StartRebuild,
}

#[derive(Debug, Default)]
pub struct RebuildController {
    state: RebuildState,
}

impl RebuildController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RebuildState {
        self.state
    }

    /// Apply one event and return the commands for the shell.
    pub fn step(&mut self, event: ControllerEvent) -> Vec<ControllerCommand> {
        let (next, commands) = match event {
            ControllerEvent::ChangeSignal => on_change(self.state),
            ControllerEvent::TimerFired => on_timer(self.state),
            ControllerEvent::RebuildCompleted => on_completion(self.state),
        };

        if next != self.state {
            debug!(from = ?self.state, to = ?next, ?event, "rebuild state transition");
        }
        self.state = next;
        commands
    }

    /// Stop scheduling anything further.
    ///
    /// Any in-flight rebuild keeps running; the supervisor simply stops
    /// feeding events, so its completion is never observed.
    pub fn shutdown(&mut self) -> Vec<ControllerCommand> {
        let was = std::mem::take(&mut self.state);
        debug!(from = ?was, "rebuild controller shut down");
        vec![ControllerCommand::CancelTimer]
    }
}

type Transition = (RebuildState, Vec<ControllerCommand>);

fn on_change(state: RebuildState) -> Transition {
    use RebuildState::*;
    match state {
        Idle | Scheduled => (Scheduled, vec![ControllerCommand::ArmTimer]),
        // The owed rebuild starts right at completion; no timer needed.
        Running | RunningWithPending => (RunningWithPending, Vec::new()),
    }
}

fn on_timer(state: RebuildState) -> Transition {
    use RebuildState::*;
    match state {
        Scheduled => (Running, vec![ControllerCommand::StartRebuild]),
        // A late timer while a rebuild runs still represents a request.
        Running | RunningWithPending => (RunningWithPending, Vec::new()),
        Idle => {
            debug!("ignoring debounce timer with nothing scheduled");
            (Idle, Vec::new())
        }
    }
}

fn on_completion(state: RebuildState) -> Transition {
    use RebuildState::*;
    match state {
        Running => (Idle, Vec::new()),
        RunningWithPending => (Running, vec![ControllerCommand::StartRebuild]),
        Idle | Scheduled => {
            debug!(?state, "ignoring rebuild completion with no rebuild running");
            (state, Vec::new())
        }
    }
}
