// src/ui/main_loop.rs

//! Cooperative loop on the UI-affine thread.
//!
//! Each iteration polls a fixed set of sources in priority order and never
//! blocks on the queues:
//!
//! 1. native UI events (one batch from the toolkit),
//! 2. at most one deferred work item,
//! 3. at most one queued error, and only while no error dialog is showing.
//!
//! Whether an error dialog is showing is tracked by [`UiContext`], which is
//! the only place error dialogs are opened and dismissed.

use tracing::{debug, info, trace};

use crate::app::Application;
use crate::dispatch::{ErrorQueue, WorkQueue};
use crate::supervisor::SupervisorCommand;

use super::callbacks::{callbacks, Action, CallbackTable};
use super::context::{DialogOutcome, UiContext};
use super::UiEvent;

/// Why [`MainLoop::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// `running` was cleared (Quit).
    Quit,
    /// A fatal dialog was dismissed; carries its message.
    Fatal(String),
}

pub struct MainLoop {
    ui: UiContext,
    app: Application,
    work: WorkQueue,
    errors: ErrorQueue,
    callbacks: CallbackTable,
}

impl MainLoop {
    pub fn new(ui: UiContext, app: Application, work: WorkQueue, errors: ErrorQueue) -> Self {
        Self {
            ui,
            app,
            work,
            errors,
            callbacks: callbacks(),
        }
    }

    pub fn showing_error(&self) -> bool {
        self.ui.showing_error()
    }

    pub fn ui(&mut self) -> &mut UiContext {
        &mut self.ui
    }

    /// Run until Quit or a dismissed fatal dialog.
    ///
    /// Teardown of the supervised process is the caller's job. Work items and
    /// errors still queued on return are dropped; callers blocked in
    /// `run_on_ui` get `ShutdownInProgress` once this loop is dropped.
    pub fn run(mut self) -> LoopExit {
        info!("main loop started");
        self.ui.begin_native_loop();

        let exit = loop {
            if !self.app.is_running() {
                break LoopExit::Quit;
            }
            if let Some(exit) = self.iterate() {
                break exit;
            }
        };

        self.ui.quit_native_loop();
        info!(?exit, "main loop finished");
        exit
    }

    /// Run a single iteration. Returns `Some` if the loop must end right away.
    pub fn iterate(&mut self) -> Option<LoopExit> {
        for event in self.ui.process_pending_events() {
            if let Some(exit) = self.handle_event(event) {
                return Some(exit);
            }
        }

        if let Some(item) = self.work.try_next() {
            trace!(?item, "running work item");
            item.run(&mut self.ui);
        }

        if !self.ui.showing_error() {
            if let Some(err) = self.errors.try_next() {
                self.ui.non_fatal(&err);
            }
        }

        None
    }

    fn handle_event(&mut self, event: UiEvent) -> Option<LoopExit> {
        match event {
            UiEvent::Signal(signal) => match self.callbacks.lookup(&signal) {
                Some(action) => self.perform(action),
                None => debug!(?signal, "no callback connected for signal"),
            },
            UiEvent::DialogResponse(handle) => match self.ui.dialog_responded(handle) {
                Some(DialogOutcome::FatalDismissed(message)) => {
                    self.app.stop_running();
                    return Some(LoopExit::Fatal(message));
                }
                Some(DialogOutcome::ErrorDismissed) | None => {}
            },
        }
        None
    }

    fn perform(&mut self, action: Action) {
        if action.is_process_control() && !self.ui.controls_enabled() {
            debug!(?action, "process controls are disabled; ignoring");
            return;
        }

        debug!(?action, "performing action");
        match action {
            Action::Quit => self.app.quit(),
            Action::StartProcess => self.app.send(SupervisorCommand::Start),
            Action::StopProcess => self.app.send(SupervisorCommand::Stop),
            Action::RestartProcess => self.app.send(SupervisorCommand::Restart),
            Action::ShowOutput => {
                let lines = self.app.output().snapshot();
                self.ui.show_output(&lines);
            }
            Action::HideOutput => self.ui.hide_output(),
        }
    }
}
