// src/ui/context.rs

//! UI-thread-owned state wrapped around the toolkit.

use std::collections::HashMap;
use std::fmt::Display;

use tracing::{debug, error, info, warn};

use crate::supervisor::StatusDisplay;
use crate::types::DialogKind;

use super::{DialogHandle, UiEvent, UiToolkit};

/// What a dialog response means for the main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    /// A fatal dialog was dismissed; the program must exit non-zero.
    FatalDismissed(String),
    /// A non-fatal error dialog was dismissed and destroyed.
    ErrorDismissed,
}

/// Tracks a dialog between `show_modal_dialog` and its response.
#[derive(Debug)]
struct OpenDialog {
    kind: DialogKind,
    message: String,
}

/// The UI-affine half of the application.
///
/// Owned by the thread that runs [`super::MainLoop`]. Deferred work items
/// receive `&mut UiContext`, which is the only way background code gets to
/// touch the toolkit. Error dialogs are opened only through
/// [`UiContext::non_fatal`], so at most one of them is ever visible.
pub struct UiContext {
    toolkit: Box<dyn UiToolkit>,
    dialogs: HashMap<DialogHandle, OpenDialog>,
    controls_enabled: bool,
}

impl UiContext {
    pub fn new(toolkit: Box<dyn UiToolkit>) -> Self {
        Self {
            toolkit,
            dialogs: HashMap::new(),
            controls_enabled: true,
        }
    }

    pub fn controls_enabled(&self) -> bool {
        self.controls_enabled
    }

    /// Number of dialogs currently shown and not yet responded to.
    pub fn open_dialogs(&self) -> usize {
        self.dialogs.len()
    }

    /// True while a non-fatal error dialog is open.
    pub fn showing_error(&self) -> bool {
        self.dialogs
            .values()
            .any(|dialog| dialog.kind == DialogKind::Error)
    }

    pub fn process_pending_events(&mut self) -> Vec<UiEvent> {
        self.toolkit.process_pending_events()
    }

    /// Show an error dialog whose dismissal terminates the program.
    ///
    /// If the native loop is not running yet (startup failures), this drives a
    /// nested event loop until the dialog is dismissed and then returns; the
    /// caller is expected to exit with a non-zero status. If the loop is
    /// running, the dialog is registered and the main loop ends with
    /// [`super::LoopExit::Fatal`] once it is dismissed.
    pub fn fatal(&mut self, err: &dyn Display) {
        let message = err.to_string();
        error!(error = %message, "fatal error");

        let handle = self.show(DialogKind::Fatal, message);

        if self.toolkit.is_native_loop_active() {
            return;
        }

        debug!(%handle, "no native loop active; running nested loop for fatal dialog");
        loop {
            let events = self.toolkit.process_pending_events();
            let dismissed = events
                .iter()
                .any(|ev| matches!(ev, UiEvent::DialogResponse(h) if *h == handle));
            if dismissed {
                self.dialogs.remove(&handle);
                self.toolkit.destroy_dialog(handle);
                return;
            }
        }
    }

    /// Show an error dialog and grey out the process controls until it is
    /// dismissed. The program keeps running.
    ///
    /// Returns `false` without showing anything while another error dialog is
    /// open; the caller keeps the error queued.
    pub(crate) fn non_fatal(&mut self, err: &dyn Display) -> bool {
        if self.showing_error() {
            debug!("an error dialog is already open; not showing another");
            return false;
        }
        let message = err.to_string();
        warn!(error = %message, "showing error dialog");
        self.show(DialogKind::Error, message);
        self.disable();
        true
    }

    /// Resolve a dialog response reported by the toolkit.
    ///
    /// Non-fatal dialogs are destroyed here, and the process controls come
    /// back once no error dialog is left. Unknown handles yield `None`.
    pub fn dialog_responded(&mut self, handle: DialogHandle) -> Option<DialogOutcome> {
        let dialog = match self.dialogs.remove(&handle) {
            Some(d) => d,
            None => {
                debug!(%handle, "response for unknown dialog; ignoring");
                return None;
            }
        };

        match dialog.kind {
            DialogKind::Fatal => {
                info!(%handle, "fatal dialog dismissed");
                self.toolkit.destroy_dialog(handle);
                Some(DialogOutcome::FatalDismissed(dialog.message))
            }
            DialogKind::Error => {
                debug!(%handle, "error dialog dismissed");
                self.toolkit.destroy_dialog(handle);
                if !self.showing_error() {
                    self.enable();
                }
                Some(DialogOutcome::ErrorDismissed)
            }
        }
    }

    pub fn render_status(&mut self, display: &StatusDisplay) {
        self.toolkit.set_status(display.icon, &display.text);
    }

    pub fn show_output(&mut self, lines: &[String]) {
        self.toolkit.show_output(lines);
    }

    pub fn hide_output(&mut self) {
        self.toolkit.hide_output();
    }

    pub(crate) fn begin_native_loop(&mut self) {
        self.toolkit.begin_native_loop();
    }

    pub(crate) fn quit_native_loop(&mut self) {
        self.toolkit.quit_native_loop();
    }

    /// Propagate the degraded state: process controls are greyed out.
    fn disable(&mut self) {
        self.controls_enabled = false;
        self.toolkit.set_controls_enabled(false);
    }

    fn enable(&mut self) {
        self.controls_enabled = true;
        self.toolkit.set_controls_enabled(true);
    }

    fn show(&mut self, kind: DialogKind, message: String) -> DialogHandle {
        let handle = self.toolkit.show_modal_dialog(kind, &message);
        self.dialogs.insert(handle, OpenDialog { kind, message });
        handle
    }
}
