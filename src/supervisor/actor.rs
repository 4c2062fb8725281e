// src/supervisor/actor.rs

//! The supervisor actor.
//!
//! One Tokio task owns the process record and reacts to three sources:
//! - operator commands (start/stop/restart/quit) from the command channel,
//! - completion of the readiness probe for the current spawn,
//! - a liveness tick that notices the process exiting on its own.
//!
//! Because commands are processed one at a time by `&mut self` methods, the
//! process handle needs no lock. Every status change goes through
//! [`Application::apply_status_event`], i.e. through the state machine and the
//! status lock.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::app::Application;
use crate::config::ConfigFile;
use crate::errors::TetherError;

use super::launcher::{ProcessHandle, ProcessLauncher};
use super::output::OutputLog;
use super::probe::ReadinessProbe;
use super::state::{ProcessStatus, StatusEvent};
use super::SupervisorCommand;

/// Result of a bounded readiness wait: the outer `Err` means the probe timed
/// out, the inner one that it failed.
type ProbeOutcome = Result<anyhow::Result<()>, time::error::Elapsed>;
type PendingProbe = std::pin::Pin<Box<dyn std::future::Future<Output = ProbeOutcome> + Send>>;

#[derive(Debug, Clone, Copy)]
pub struct SupervisorOptions {
    /// Upper bound on the readiness wait after each spawn.
    pub probe_timeout: Duration,
    /// How often a running process is checked for an unexpected exit.
    pub liveness_interval: Duration,
}

impl SupervisorOptions {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            probe_timeout: cfg.probe.timeout,
            liveness_interval: cfg.supervisor.liveness_interval,
        }
    }
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(10),
            liveness_interval: Duration::from_secs(1),
        }
    }
}

pub struct ProcessSupervisor {
    app: Application,
    launcher: Arc<dyn ProcessLauncher>,
    probe: Arc<dyn ReadinessProbe>,
    executable: PathBuf,
    args: Vec<String>,
    options: SupervisorOptions,
    output: OutputLog,
    handle: Option<Box<dyn ProcessHandle>>,
    pending_probe: Option<PendingProbe>,
    spawn_count: u64,
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("executable", &self.executable)
            .field("args", &self.args)
            .field("options", &self.options)
            .field("has_handle", &self.handle.is_some())
            .field("probing", &self.pending_probe.is_some())
            .finish_non_exhaustive()
    }
}

impl ProcessSupervisor {
    /// `executable` must already be resolved; a missing executable is a
    /// startup failure handled before the supervisor exists.
    pub fn new(
        app: Application,
        launcher: Arc<dyn ProcessLauncher>,
        probe: Arc<dyn ReadinessProbe>,
        executable: PathBuf,
        args: Vec<String>,
        options: SupervisorOptions,
    ) -> Self {
        let output = app.output().clone();
        Self {
            app,
            launcher,
            probe,
            executable,
            args,
            options,
            output,
            handle: None,
            pending_probe: None,
            spawn_count: 0,
        }
    }

    pub fn status(&self) -> ProcessStatus {
        self.app.status()
    }

    /// Actor loop. Returns after `Quit`, or once every command sender is gone;
    /// the process is terminated in both cases.
    ///
    /// When `commands` comes from [`super::supervisor_channel`], the
    /// [`Application`] holds the sender for as long as the supervisor holds
    /// the application, so `Quit` is what ends the loop. A supervisor driven
    /// through its own channel also stops when that channel closes.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SupervisorCommand>) {
        info!(executable = %self.executable.display(), "supervisor started");

        let mut liveness = time::interval(self.options.liveness_interval);
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SupervisorCommand::Quit) => {
                        self.quit();
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        info!("supervisor command channel closed");
                        self.stop();
                        break;
                    }
                },
                outcome = next_probe_outcome(&mut self.pending_probe) => {
                    self.finish_probe(outcome);
                }
                _ = liveness.tick() => self.check_liveness(),
            }
        }

        info!("supervisor exiting");
    }

    pub fn handle_command(&mut self, command: SupervisorCommand) {
        debug!(?command, status = %self.status(), "supervisor received command");
        match command {
            SupervisorCommand::Start => self.start(),
            SupervisorCommand::Stop => self.stop(),
            SupervisorCommand::Restart => self.restart(),
            SupervisorCommand::Quit => self.quit(),
        }
    }

    /// Spawn the process and begin the readiness probe.
    ///
    /// Ignored while a process is already connecting or connected. Spawn
    /// failures are recoverable: status becomes `Failed` and the error is
    /// queued for display.
    pub fn start(&mut self) {
        let status = self.status();
        if self.handle.is_some() && status.is_active() {
            warn!(%status, "start requested but process is already running; ignoring");
            return;
        }
        if status != ProcessStatus::NotStarted {
            // Leftover Failed state (or a dead handle): reset before spawning.
            self.stop();
        }

        self.spawn_count += 1;
        let output = self.output.begin_run();

        match self.launcher.spawn(&self.executable, &self.args, &output) {
            Ok(handle) => {
                info!(pid = ?handle.id(), attempt = self.spawn_count, "process spawned; probing readiness");
                self.handle = Some(handle);
                self.transition(StatusEvent::Spawned);

                let probe = self.probe.wait_ready();
                self.pending_probe = Some(Box::pin(time::timeout(self.options.probe_timeout, probe)));
            }
            Err(err) => {
                warn!(error = %err, "failed to spawn process");
                self.transition(StatusEvent::SpawnFailed);
                self.app.report(err);
            }
        }
    }

    /// Kill the process if there is one; status becomes `NotStarted`.
    pub fn stop(&mut self) {
        if self.pending_probe.take().is_some() {
            debug!("abandoning in-flight readiness probe");
        }
        self.terminate_handle();
        self.transition(StatusEvent::Stopped);
    }

    pub fn restart(&mut self) {
        info!("restarting supervised process");
        self.stop();
        self.start();
    }

    /// Terminate the process and make the main loop exit.
    pub fn quit(&mut self) {
        self.pending_probe = None;
        self.terminate_handle();
        self.app.stop_running();
    }

    /// React to the bounded readiness wait finishing.
    ///
    /// A process that never became ready is killed and left `Failed`. There is
    /// no automatic retry; the operator restarts explicitly.
    pub fn finish_probe(&mut self, outcome: ProbeOutcome) {
        let program = self.app.program().to_string();
        match outcome {
            Ok(Ok(())) => {
                self.transition(StatusEvent::ProbeSucceeded);
            }
            Ok(Err(e)) => {
                warn!(error = %e, "readiness probe failed");
                self.terminate_handle();
                self.transition(StatusEvent::ProbeFailed);
                self.app.report(TetherError::ProbeFailed {
                    program,
                    reason: format!("{e:#}"),
                });
            }
            Err(_elapsed) => {
                warn!(timeout = ?self.options.probe_timeout, "readiness probe timed out");
                self.terminate_handle();
                self.transition(StatusEvent::ProbeFailed);
                self.app.report(TetherError::ProbeTimedOut {
                    program,
                    timeout: self.options.probe_timeout,
                });
            }
        }
    }

    /// Notice the process exiting without being asked to.
    pub fn check_liveness(&mut self) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        match handle.try_wait() {
            Ok(None) => {}
            Ok(Some(exit)) => {
                warn!(%exit, "supervised process exited unexpectedly");
                self.handle = None;
                self.pending_probe = None;
                self.transition(StatusEvent::Exited);
                self.app.report(TetherError::ProcessExited {
                    program: self.app.program().to_string(),
                    status: exit.to_string(),
                });
            }
            Err(e) => {
                debug!(error = %e, "failed to poll process state");
            }
        }
    }

    fn terminate_handle(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            info!(pid = ?handle.id(), "terminating supervised process");
            if let Err(e) = handle.terminate() {
                warn!(error = %e, "failed to kill supervised process");
            }
        }
    }

    fn transition(&self, event: StatusEvent) {
        if let Err(e) = self.app.apply_status_event(event) {
            warn!(error = %e, "ignoring status event");
        }
    }
}

/// Resolves with the outcome of the pending probe, or never if there is none.
///
/// Dropping this future (when another `select!` branch wins) leaves the probe
/// itself in place.
async fn next_probe_outcome(pending: &mut Option<PendingProbe>) -> ProbeOutcome {
    match pending.as_mut() {
        Some(probe) => {
            let outcome = probe.await;
            *pending = None;
            outcome
        }
        None => std::future::pending().await,
    }
}
