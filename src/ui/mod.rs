// src/ui/mod.rs

//! Everything that runs on the UI-affine thread.
//!
//! The widget toolkit itself is an external collaborator reached through the
//! [`UiToolkit`] trait. On top of it this module provides:
//!
//! - [`context`]: the UI-thread-owned [`UiContext`] that tracks open dialogs and
//!   implements the Fatal / NonFatal presentation.
//! - [`callbacks`]: the `(widget, signal) -> Action` table wired into the
//!   window and menu.
//! - [`main_loop`]: the cooperative loop draining native events, deferred work
//!   and queued errors, in that order.
//! - [`console`]: a small stdin/stdout toolkit used by the `tether` binary.

use std::fmt;

use crate::types::{DialogKind, StatusIcon};

pub mod callbacks;
pub mod console;
pub mod context;
pub mod main_loop;

pub use callbacks::{Action, CallbackTable};
pub use console::ConsoleUi;
pub use context::{DialogOutcome, UiContext};
pub use main_loop::{LoopExit, MainLoop};

/// Opaque identifier of a dialog shown by the toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DialogHandle(pub u64);

impl fmt::Display for DialogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialog#{}", self.0)
    }
}

/// A named widget emitting a named signal, e.g. `("menu-quit", "activate")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetSignal {
    pub widget: String,
    pub signal: String,
}

impl WidgetSignal {
    pub fn new(widget: impl Into<String>, signal: impl Into<String>) -> Self {
        Self {
            widget: widget.into(),
            signal: signal.into(),
        }
    }
}

/// One native event reported by the toolkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A widget fired a signal (menu item activated, window closed, ...).
    Signal(WidgetSignal),
    /// The user responded to (dismissed) a modal dialog.
    DialogResponse(DialogHandle),
}

/// Interface to the native UI toolkit.
///
/// Every method must be called from the UI-affine thread; implementations are
/// therefore not required to be `Send`.
pub trait UiToolkit {
    /// Process one batch of pending native events and report the ones the
    /// application cares about. May wait briefly, but must not block
    /// indefinitely.
    fn process_pending_events(&mut self) -> Vec<UiEvent>;

    /// Show a modal dialog. Its dismissal is reported later as
    /// [`UiEvent::DialogResponse`] with the returned handle.
    fn show_modal_dialog(&mut self, kind: DialogKind, message: &str) -> DialogHandle;

    fn destroy_dialog(&mut self, handle: DialogHandle);

    /// Mark the native loop as running. Called by [`MainLoop::run`] on entry.
    fn begin_native_loop(&mut self);

    /// Leave the native loop. Called by [`MainLoop::run`] on exit.
    fn quit_native_loop(&mut self);

    fn is_native_loop_active(&self) -> bool;

    /// Update the status widget.
    fn set_status(&mut self, icon: StatusIcon, text: &str);

    /// Enable or disable the process-control actions (start/stop/restart).
    fn set_controls_enabled(&mut self, enabled: bool);

    /// Show the output window with the given captured lines.
    fn show_output(&mut self, lines: &[String]);

    fn hide_output(&mut self);
}
