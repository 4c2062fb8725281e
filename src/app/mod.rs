// src/app/mod.rs

//! The application coordinator.
//!
//! [`Application`] is constructed once at startup and handed (as a cheap
//! clone) to every component that needs it: the main loop, the supervisor
//! actor, signal handlers. It owns:
//!
//! - the `running` flag read by the main loop,
//! - the process status cell behind the status lock,
//! - the producer sides of the work and error queues,
//! - the command channel of the supervisor and its captured output.
//!
//! [`Application::set_status`] is the one operation that may be called from
//! any thread without going through the work queue: it only stores the status
//! under the lock and posts the matching widget update, so the stored status
//! and its presentation always change together.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::dispatch::{ErrorChannel, WorkDispatcher};
use crate::errors::{Result, Severity, TetherError};
use crate::supervisor::{
    InvalidTransition, OutputLog, ProcessStatus, StatusDisplay, StatusEvent, SupervisorCommand,
    SupervisorHandle,
};
use crate::ui::UiContext;

/// Status of the supervised process together with its presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCell {
    pub status: ProcessStatus,
    pub display: StatusDisplay,
}

struct Shared {
    program: String,
    running: AtomicBool,
    status: Arc<Mutex<StatusCell>>,
    work: WorkDispatcher,
    errors: ErrorChannel,
    supervisor: SupervisorHandle,
    output: OutputLog,
}

#[derive(Clone)]
pub struct Application {
    inner: Arc<Shared>,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("program", &self.inner.program)
            .field("running", &self.is_running())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Application {
    pub fn new(
        program: impl Into<String>,
        work: WorkDispatcher,
        errors: ErrorChannel,
        supervisor: SupervisorHandle,
        output: OutputLog,
    ) -> Self {
        let program = program.into();
        let initial = ProcessStatus::NotStarted;
        let cell = StatusCell {
            status: initial,
            display: initial.display(&program),
        };

        Self {
            inner: Arc::new(Shared {
                program,
                running: AtomicBool::new(true),
                status: Arc::new(Mutex::new(cell)),
                work,
                errors,
                supervisor,
                output,
            }),
        }
    }

    /// Name of the supervised program, as shown to the user.
    pub fn program(&self) -> &str {
        &self.inner.program
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Quit the application: ask the supervisor to terminate the process,
    /// then let the main loop exit at its next boundary check.
    ///
    /// Work items still queued at that point are not drained.
    pub fn quit(&self) {
        info!("quit requested");
        self.inner.supervisor.send(SupervisorCommand::Quit);
        self.stop_running();
    }

    /// Clear the `running` flag without touching the supervisor.
    pub fn stop_running(&self) {
        self.inner.running.store(false, Ordering::Release);
    }

    /// Forward a command to the supervisor actor.
    pub fn send(&self, command: SupervisorCommand) {
        self.inner.supervisor.send(command);
    }

    /// Current process status.
    pub fn status(&self) -> ProcessStatus {
        self.lock_status().status
    }

    /// Status and its presentation, read together under the status lock.
    pub fn status_snapshot(&self) -> StatusCell {
        self.lock_status().clone()
    }

    /// Store `status` and dispatch the matching widget update, atomically with
    /// respect to other status readers and writers.
    pub fn set_status(&self, status: ProcessStatus) {
        let mut cell = self.lock_status();
        self.store_locked(&mut cell, status);
    }

    /// Apply a lifecycle event through the status state machine.
    ///
    /// The transition is decided and stored under the status lock, so
    /// concurrent events cannot interleave between the check and the write.
    pub fn apply_status_event(
        &self,
        event: StatusEvent,
    ) -> std::result::Result<ProcessStatus, InvalidTransition> {
        let mut cell = self.lock_status();
        let next = cell.status.apply(event)?;
        self.store_locked(&mut cell, next);
        Ok(next)
    }

    /// Run `f` on the UI thread and wait for its result ("Do").
    pub fn run_on_ui<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut UiContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.inner.work.call_blocking(f)
    }

    /// Async form of [`Application::run_on_ui`].
    pub async fn run_on_ui_async<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut UiContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.inner.work.call(f).await
    }

    /// Enqueue `f` for the UI thread without waiting.
    pub fn post<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut UiContext) + Send + 'static,
    {
        self.inner.work.post(f)
    }

    /// Surface `err` according to its severity: recoverable errors are queued
    /// for a non-fatal dialog, anything else goes through [`Application::fatal`].
    pub fn report(&self, err: TetherError) {
        match err.severity() {
            Severity::Recoverable => self.inner.errors.report(err),
            Severity::Fatal => self.fatal(err),
        }
    }

    /// Show a fatal error from any thread. The program exits once the user
    /// dismisses the dialog.
    pub fn fatal(&self, err: impl Display + Send + 'static) {
        let message = err.to_string();
        if self.post(move |ui| ui.fatal(&message)).is_err() {
            warn!("main loop has exited; fatal error not displayed");
            self.stop_running();
        }
    }

    /// Captured output of the supervised process.
    pub fn output(&self) -> &OutputLog {
        &self.inner.output
    }

    fn lock_status(&self) -> MutexGuard<'_, StatusCell> {
        self.inner
            .status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Must be called with the status lock held (`cell` is the guard's data).
    fn store_locked(&self, cell: &mut StatusCell, status: ProcessStatus) {
        let previous = cell.status;
        cell.status = status;
        cell.display = status.display(&self.inner.program);
        info!(from = %previous, to = %status, text = %cell.display.text, "process status changed");

        // The widget update renders whatever pair is current when it runs, read
        // under the same lock, so it can never show a stale label for a newer
        // status.
        let shared = Arc::clone(&self.inner.status);
        let posted = self.inner.work.post(move |ui| {
            let display = shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .display
                .clone();
            ui.render_status(&display);
        });
        if posted.is_err() {
            debug!(%status, "main loop has exited; status not rendered");
        }
    }
}
