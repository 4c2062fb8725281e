// src/ui/callbacks.rs

//! Mapping from named widget signals to application actions.
//!
//! The window/menu builder only knows widget and signal names. This table is
//! what connects them to the application; the main loop looks every
//! [`UiEvent::Signal`](super::UiEvent::Signal) up here.

use std::collections::BTreeMap;

use super::WidgetSignal;

pub const MAIN_WINDOW: &str = "main-window";
pub const MENU_QUIT: &str = "menu-quit";
pub const MENU_SERVER_START: &str = "menu-server-start";
pub const MENU_SERVER_STOP: &str = "menu-server-stop";
pub const MENU_SERVER_RESTART: &str = "menu-server-restart";
pub const MENU_SERVER_OUTPUT: &str = "menu-server-output";
pub const OUTPUT_WINDOW: &str = "output-window";

pub const SIGNAL_ACTIVATE: &str = "activate";
pub const SIGNAL_DESTROY: &str = "destroy";
pub const SIGNAL_DELETE_EVENT: &str = "delete-event";

/// Something the user asked the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    StartProcess,
    StopProcess,
    RestartProcess,
    ShowOutput,
    HideOutput,
}

impl Action {
    /// Process-control actions are ignored while controls are disabled.
    pub fn is_process_control(self) -> bool {
        matches!(
            self,
            Action::StartProcess | Action::StopProcess | Action::RestartProcess
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallbackTable {
    entries: BTreeMap<WidgetSignal, Action>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, widget: &str, signal: &str, action: Action) -> &mut Self {
        self.entries.insert(WidgetSignal::new(widget, signal), action);
        self
    }

    pub fn lookup(&self, signal: &WidgetSignal) -> Option<Action> {
        self.entries.get(signal).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WidgetSignal, Action)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }
}

/// The table used by the application's window and menu.
pub fn callbacks() -> CallbackTable {
    let mut table = CallbackTable::new();
    table
        .connect(MAIN_WINDOW, SIGNAL_DESTROY, Action::Quit)
        .connect(MENU_QUIT, SIGNAL_ACTIVATE, Action::Quit)
        .connect(MENU_SERVER_START, SIGNAL_ACTIVATE, Action::StartProcess)
        .connect(MENU_SERVER_STOP, SIGNAL_ACTIVATE, Action::StopProcess)
        .connect(MENU_SERVER_RESTART, SIGNAL_ACTIVATE, Action::RestartProcess)
        .connect(MENU_SERVER_OUTPUT, SIGNAL_ACTIVATE, Action::ShowOutput)
        .connect(OUTPUT_WINDOW, SIGNAL_DELETE_EVENT, Action::HideOutput);
    table
}
