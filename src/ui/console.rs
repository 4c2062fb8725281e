// src/ui/console.rs

//! Line-oriented console toolkit used by the `tether` binary.
//!
//! A reader thread turns stdin lines into widget signals:
//!
//! | input                 | widget / signal                   |
//! |-----------------------|-----------------------------------|
//! | `start`               | `menu-server-start` / `activate`  |
//! | `stop`                | `menu-server-stop` / `activate`   |
//! | `restart`             | `menu-server-restart` / `activate`|
//! | `output`              | `menu-server-output` / `activate` |
//! | `close`               | `output-window` / `delete-event`  |
//! | `quit`                | `menu-quit` / `activate`          |
//! | end of input          | `main-window` / `destroy`         |
//!
//! `ok` dismisses the oldest open dialog. Everything is rendered to stdout;
//! logs go to stderr.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::types::{DialogKind, StatusIcon};

use super::callbacks::{
    MAIN_WINDOW, MENU_QUIT, MENU_SERVER_OUTPUT, MENU_SERVER_RESTART, MENU_SERVER_START,
    MENU_SERVER_STOP, OUTPUT_WINDOW, SIGNAL_ACTIVATE, SIGNAL_DELETE_EVENT, SIGNAL_DESTROY,
};
use super::{DialogHandle, UiEvent, UiToolkit, WidgetSignal};

/// Upper bound on how long one batch of native events may wait for input.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

enum Input {
    Line(String),
    Eof,
}

pub struct ConsoleUi {
    input: Receiver<Input>,
    next_dialog: u64,
    dialogs: Vec<DialogHandle>,
    loop_active: bool,
    controls_enabled: bool,
    status: String,
    closed: bool,
    /// Events produced outside of input handling, reported with the next batch.
    pending: Vec<UiEvent>,
}

impl ConsoleUi {
    /// Start the stdin reader thread and print the command help.
    pub fn new() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("console-input".to_string())
            .spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(Input::Line(line)).is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to read console input");
                            break;
                        }
                    }
                }
                let _ = tx.send(Input::Eof);
            })?;

        let ui = Self::from_input(rx);
        ui.print_help();
        Ok(ui)
    }

    fn from_input(input: Receiver<Input>) -> Self {
        Self {
            input,
            next_dialog: 0,
            dialogs: Vec::new(),
            loop_active: false,
            controls_enabled: true,
            status: String::new(),
            closed: false,
            pending: Vec::new(),
        }
    }

    fn print_help(&self) {
        println!("commands: start | stop | restart | output | close | status | ok | quit");
    }

    fn translate(&mut self, input: Input) -> Vec<UiEvent> {
        let line = match input {
            Input::Line(line) => line,
            Input::Eof => {
                debug!("console input closed");
                self.closed = true;
                // Closing the terminal answers every open dialog.
                let mut events: Vec<UiEvent> = self
                    .dialogs
                    .drain(..)
                    .map(UiEvent::DialogResponse)
                    .collect();
                events.push(signal(MAIN_WINDOW, SIGNAL_DESTROY));
                return events;
            }
        };

        let event = match line.trim().to_lowercase().as_str() {
            "" => return Vec::new(),
            "ok" => {
                if self.dialogs.is_empty() {
                    println!("no dialog to dismiss");
                    return Vec::new();
                }
                UiEvent::DialogResponse(self.dialogs.remove(0))
            }
            "start" | "stop" | "restart" if !self.controls_enabled => {
                println!("process controls are disabled until the error is dismissed (type `ok`)");
                return Vec::new();
            }
            "start" => signal(MENU_SERVER_START, SIGNAL_ACTIVATE),
            "stop" => signal(MENU_SERVER_STOP, SIGNAL_ACTIVATE),
            "restart" => signal(MENU_SERVER_RESTART, SIGNAL_ACTIVATE),
            "output" => signal(MENU_SERVER_OUTPUT, SIGNAL_ACTIVATE),
            "close" => signal(OUTPUT_WINDOW, SIGNAL_DELETE_EVENT),
            "quit" | "exit" => signal(MENU_QUIT, SIGNAL_ACTIVATE),
            "status" => {
                println!("status: {}", self.status);
                return Vec::new();
            }
            other => {
                println!("unknown command: {other}");
                self.print_help();
                return Vec::new();
            }
        };

        vec![event]
    }
}

fn signal(widget: &str, signal: &str) -> UiEvent {
    UiEvent::Signal(WidgetSignal::new(widget, signal))
}

impl UiToolkit for ConsoleUi {
    fn process_pending_events(&mut self) -> Vec<UiEvent> {
        let mut events = std::mem::take(&mut self.pending);
        if self.closed {
            if events.is_empty() {
                // Input is gone; keep the loop cadence without spinning.
                thread::sleep(POLL_INTERVAL);
            }
            return events;
        }

        match self.input.recv_timeout(POLL_INTERVAL) {
            Ok(input) => events.extend(self.translate(input)),
            Err(RecvTimeoutError::Timeout) => return events,
            Err(RecvTimeoutError::Disconnected) => {
                events.extend(self.translate(Input::Eof));
                return events;
            }
        }

        // Drain whatever else is already buffered in this batch.
        while let Ok(input) = self.input.try_recv() {
            events.extend(self.translate(input));
        }
        events
    }

    fn show_modal_dialog(&mut self, kind: DialogKind, message: &str) -> DialogHandle {
        self.next_dialog += 1;
        let handle = DialogHandle(self.next_dialog);
        let title = match kind {
            DialogKind::Fatal => "FATAL",
            DialogKind::Error => "ERROR",
        };
        println!("[{title}] {message}  (type `ok` to dismiss)");
        let _ = io::stdout().flush();
        if self.closed {
            // Nobody can answer it any more.
            self.pending.push(UiEvent::DialogResponse(handle));
        } else {
            self.dialogs.push(handle);
        }
        handle
    }

    fn destroy_dialog(&mut self, handle: DialogHandle) {
        self.dialogs.retain(|h| *h != handle);
    }

    fn begin_native_loop(&mut self) {
        self.loop_active = true;
    }

    fn quit_native_loop(&mut self) {
        self.loop_active = false;
    }

    fn is_native_loop_active(&self) -> bool {
        self.loop_active
    }

    fn set_status(&mut self, icon: StatusIcon, text: &str) {
        self.status = text.to_string();
        match icon {
            StatusIcon::Connect => println!("[status] (connected) {text}"),
            StatusIcon::None => println!("[status] {text}"),
        }
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled = enabled;
    }

    fn show_output(&mut self, lines: &[String]) {
        println!("----- process output ({} lines) -----", lines.len());
        for line in lines {
            println!("{line}");
        }
        println!("----- end of output -----");
    }

    fn hide_output(&mut self) {
        println!("(output window closed)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console() -> (mpsc::Sender<Input>, ConsoleUi) {
        let (tx, rx) = mpsc::channel();
        (tx, ConsoleUi::from_input(rx))
    }

    fn line(s: &str) -> Input {
        Input::Line(s.to_string())
    }

    #[test]
    fn commands_become_widget_signals() {
        let (tx, mut ui) = console();
        tx.send(line("start")).unwrap();
        tx.send(line("  Restart ")).unwrap();
        tx.send(line("bogus")).unwrap();
        tx.send(line("quit")).unwrap();

        assert_eq!(
            ui.process_pending_events(),
            vec![
                signal(MENU_SERVER_START, SIGNAL_ACTIVATE),
                signal(MENU_SERVER_RESTART, SIGNAL_ACTIVATE),
                signal(MENU_QUIT, SIGNAL_ACTIVATE),
            ]
        );
    }

    #[test]
    fn ok_dismisses_the_oldest_dialog() {
        let (tx, mut ui) = console();
        let first = ui.show_modal_dialog(DialogKind::Error, "one");
        let _second = ui.show_modal_dialog(DialogKind::Error, "two");

        tx.send(line("ok")).unwrap();
        assert_eq!(
            ui.process_pending_events(),
            vec![UiEvent::DialogResponse(first)]
        );
    }

    #[test]
    fn controls_are_refused_while_disabled() {
        let (tx, mut ui) = console();
        ui.set_controls_enabled(false);
        tx.send(line("stop")).unwrap();
        tx.send(line("output")).unwrap();

        assert_eq!(
            ui.process_pending_events(),
            vec![signal(MENU_SERVER_OUTPUT, SIGNAL_ACTIVATE)]
        );
    }

    #[test]
    fn end_of_input_answers_dialogs_and_closes_the_window() {
        let (tx, mut ui) = console();
        let open = ui.show_modal_dialog(DialogKind::Fatal, "bad");
        drop(tx);

        assert_eq!(
            ui.process_pending_events(),
            vec![
                UiEvent::DialogResponse(open),
                signal(MAIN_WINDOW, SIGNAL_DESTROY),
            ]
        );

        // Dialogs shown afterwards are answered straight away.
        let late = ui.show_modal_dialog(DialogKind::Fatal, "late");
        assert_eq!(
            ui.process_pending_events(),
            vec![UiEvent::DialogResponse(late)]
        );
    }
}
