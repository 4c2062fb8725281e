// src/supervisor/state.rs

//! Lifecycle state machine for the supervised process.
//!
//! Every status change goes through [`ProcessStatus::apply`], which encodes the
//! full transition table in one exhaustive `match`. Anything not listed there
//! is rejected with [`InvalidTransition`] instead of silently happening.

use std::fmt;

use thiserror::Error;

use crate::types::StatusIcon;

/// Status of the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessStatus {
    /// No process handle, or the previous one was stopped.
    #[default]
    NotStarted,
    /// Spawned; readiness probe in flight.
    Connecting,
    /// Readiness probe succeeded.
    Connected,
    /// Probe failed or timed out, spawn failed, or the process exited.
    Failed,
}

/// Something that happened to the supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Spawned,
    SpawnFailed,
    ProbeSucceeded,
    ProbeFailed,
    Exited,
    Stopped,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid status transition: {event:?} while {from:?}")]
pub struct InvalidTransition {
    pub from: ProcessStatus,
    pub event: StatusEvent,
}

impl ProcessStatus {
    /// Compute the status that follows `event`.
    pub fn apply(self, event: StatusEvent) -> Result<ProcessStatus, InvalidTransition> {
        use ProcessStatus::*;
        use StatusEvent::*;

        let next = match (self, event) {
            (_, Stopped) => NotStarted,

            (NotStarted, Spawned) => Connecting,
            (NotStarted, SpawnFailed) => Failed,
            (Connecting, ProbeSucceeded) => Connected,
            (Connecting, ProbeFailed) => Failed,
            (Connecting | Connected | Failed, Exited) => Failed,

            (NotStarted, ProbeSucceeded | ProbeFailed | Exited)
            | (Connecting | Connected | Failed, Spawned | SpawnFailed)
            | (Connected | Failed, ProbeSucceeded | ProbeFailed) => {
                return Err(InvalidTransition { from: self, event });
            }
        };

        Ok(next)
    }

    /// Whether a process handle is expected to be alive in this state.
    pub fn is_active(self) -> bool {
        matches!(self, ProcessStatus::Connecting | ProcessStatus::Connected)
    }

    /// Label text and icon shown for this status.
    pub fn display(self, program: &str) -> StatusDisplay {
        match self {
            ProcessStatus::NotStarted => StatusDisplay::new(StatusIcon::None, "Stopped."),
            ProcessStatus::Connecting => StatusDisplay::new(StatusIcon::None, "Connecting..."),
            ProcessStatus::Connected => {
                StatusDisplay::new(StatusIcon::Connect, format!("Connected to {program}."))
            }
            ProcessStatus::Failed => StatusDisplay::new(StatusIcon::None, "Not connected."),
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::NotStarted => write!(f, "not started"),
            ProcessStatus::Connecting => write!(f, "connecting"),
            ProcessStatus::Connected => write!(f, "connected"),
            ProcessStatus::Failed => write!(f, "failed"),
        }
    }
}

/// What the status widget shows for a given [`ProcessStatus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDisplay {
    pub icon: StatusIcon,
    pub text: String,
}

impl StatusDisplay {
    pub fn new(icon: StatusIcon, text: impl Into<String>) -> Self {
        Self {
            icon,
            text: text.into(),
        }
    }
}
