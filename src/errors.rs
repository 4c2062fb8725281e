// src/errors.rs

//! Crate-wide error type and failure classification.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// How an error propagates once it reaches the user.
///
/// - `Fatal`: one dialog, then the program exits with a non-zero status.
/// - `Recoverable`: queued on the error channel and shown as a non-fatal
///   dialog; process controls are disabled until it is dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Recoverable,
}

#[derive(Error, Debug)]
pub enum TetherError {
    #[error("{0} is not installed.")]
    DependencyMissing(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Could not determine the current user's home directory")]
    HomeDirUnavailable,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to launch {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("{program} did not become ready: {reason}")]
    ProbeFailed { program: String, reason: String },

    #[error("{program} did not become ready within {}", humantime_fmt(.timeout))]
    ProbeTimedOut { program: String, timeout: Duration },

    #[error("{program} exited unexpectedly ({status})")]
    ProcessExited { program: String, status: String },

    #[error("UI thread has shut down")]
    ShutdownInProgress,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TetherError {
    /// Classify this error for the error-surfacing path.
    ///
    /// Everything that can only go wrong before the supervisor exists is fatal;
    /// failures of the supervised process itself are recoverable because the
    /// operator can restart it.
    pub fn severity(&self) -> Severity {
        match self {
            TetherError::SpawnFailed { .. }
            | TetherError::ProbeFailed { .. }
            | TetherError::ProbeTimedOut { .. }
            | TetherError::ProcessExited { .. } => Severity::Recoverable,
            TetherError::DependencyMissing(_)
            | TetherError::ConfigError(_)
            | TetherError::ConfigNotFound(_)
            | TetherError::TomlError(_)
            | TetherError::HomeDirUnavailable
            | TetherError::IoError(_)
            | TetherError::ShutdownInProgress
            | TetherError::Other(_) => Severity::Fatal,
        }
    }
}

fn humantime_fmt(d: &Duration) -> String {
    format!("{}", humantime::format_duration(*d))
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TetherError>;
