// src/supervisor/mod.rs

//! Supervision of the external long-running process.
//!
//! - [`state`]: the `ProcessStatus` state machine and its presentation.
//! - [`launcher`]: the OS process primitives (`lookup_executable`, `spawn`,
//!   `terminate`) behind the [`ProcessLauncher`] trait, with the real
//!   implementation in [`SystemLauncher`].
//! - [`probe`]: readiness probes run after every spawn.
//! - [`output`]: bounded capture of the process's stdout/stderr.
//! - [`actor`]: the [`ProcessSupervisor`] actor that owns the process handle
//!   and serializes start/stop/restart/quit by processing one
//!   [`SupervisorCommand`] at a time.

use tokio::sync::mpsc;
use tracing::debug;

pub mod actor;
pub mod launcher;
pub mod output;
pub mod probe;
pub mod state;

pub use actor::{ProcessSupervisor, SupervisorOptions};
pub use launcher::{ExitInfo, ProcessHandle, ProcessLauncher, SystemLauncher};
pub use output::OutputLog;
pub use probe::{probe_from_config, ImmediateProbe, ProbeFuture, ReadinessProbe, TcpProbe};
pub use state::{InvalidTransition, ProcessStatus, StatusDisplay, StatusEvent};

/// Operator requests handled by the supervisor actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorCommand {
    Start,
    Stop,
    Restart,
    /// Terminate the process and end the application.
    Quit,
}

/// Create the supervisor's command channel.
pub fn supervisor_channel() -> (SupervisorHandle, mpsc::UnboundedReceiver<SupervisorCommand>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SupervisorHandle { tx }, rx)
}

/// Cloneable sender half used by the application and the UI callbacks.
#[derive(Debug, Clone)]
pub struct SupervisorHandle {
    tx: mpsc::UnboundedSender<SupervisorCommand>,
}

impl SupervisorHandle {
    /// Send a command; returns `false` if the supervisor has already exited.
    pub fn send(&self, command: SupervisorCommand) -> bool {
        match self.tx.send(command) {
            Ok(()) => true,
            Err(_) => {
                debug!(?command, "supervisor has exited; command dropped");
                false
            }
        }
    }
}
