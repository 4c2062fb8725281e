// src/supervisor/launcher.rs

//! OS process primitives used by the supervisor.
//!
//! The supervisor talks to a [`ProcessLauncher`] instead of
//! `tokio::process` directly so tests can substitute processes that never
//! touch the OS.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::errors::{Result, TetherError};

use super::output::OutputLog;

/// How a supervised process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    /// Exit code, or `None` if the process was killed by a signal.
    pub code: Option<i32>,
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// A spawned process owned by the supervisor.
pub trait ProcessHandle: Send {
    fn id(&self) -> Option<u32>;

    /// Best-effort kill. Does not wait for the process to exit.
    fn terminate(&mut self) -> io::Result<()>;

    /// Check, without blocking, whether the process has exited.
    fn try_wait(&mut self) -> io::Result<Option<ExitInfo>>;
}

/// Launches the supervised program.
pub trait ProcessLauncher: Send + Sync {
    /// Resolve `name` to an executable path, failing with
    /// [`TetherError::DependencyMissing`] if it cannot be found.
    fn lookup_executable(&self, name: &str) -> Result<PathBuf>;

    /// Spawn `path` with `args`, feeding its stdout/stderr lines into
    /// `output`. Must be called from within a Tokio runtime.
    fn spawn(
        &self,
        path: &Path,
        args: &[String],
        output: &OutputLog,
    ) -> Result<Box<dyn ProcessHandle>>;
}

/// Launcher backed by `which` and `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn lookup_executable(&self, name: &str) -> Result<PathBuf> {
        match which::which(name) {
            Ok(path) => {
                debug!(program = %name, path = %path.display(), "resolved executable");
                Ok(path)
            }
            Err(e) => {
                debug!(program = %name, error = %e, "executable lookup failed");
                Err(TetherError::DependencyMissing(name.to_string()))
            }
        }
    }

    fn spawn(
        &self,
        path: &Path,
        args: &[String],
        output: &OutputLog,
    ) -> Result<Box<dyn ProcessHandle>> {
        let program = path.display().to_string();

        let mut cmd = Command::new(path);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| TetherError::SpawnFailed {
            program: program.clone(),
            reason: e.to_string(),
        })?;

        info!(program = %program, pid = ?child.id(), ?args, "spawned supervised process");

        if let Some(stdout) = child.stdout.take() {
            spawn_output_reader(stdout, "stdout", output.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_output_reader(stderr, "stderr", output.clone());
        }

        Ok(Box::new(TokioProcess { child }))
    }
}

/// Always consume the pipes so buffers don't fill; lines are logged at debug
/// and kept in the output log.
fn spawn_output_reader<R>(stream: R, name: &'static str, output: OutputLog)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(stream = name, "{}", line);
            output.push(line);
        }
        debug!(stream = name, "output stream closed");
    });
}

struct TokioProcess {
    child: Child,
}

impl ProcessHandle for TokioProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitInfo>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| ExitInfo { code: status.code() }))
    }
}
