// tests/main_loop.rs

mod common;
use crate::common::fake_ui::{FakeUi, UiCall};
use crate::common::harness::LoopHarness;
use crate::common::init_tracing;

use std::sync::{Arc, Mutex};

use tether::errors::TetherError;
use tether::supervisor::{StatusDisplay, SupervisorCommand};
use tether::types::{DialogKind, StatusIcon};
use tether::ui::callbacks::{
    MAIN_WINDOW, MENU_QUIT, MENU_SERVER_OUTPUT, MENU_SERVER_RESTART, MENU_SERVER_START,
    MENU_SERVER_STOP, OUTPUT_WINDOW, SIGNAL_ACTIVATE, SIGNAL_DELETE_EVENT, SIGNAL_DESTROY,
};
use tether::ui::{DialogHandle, LoopExit};

fn exited(program: &str) -> TetherError {
    TetherError::ProcessExited {
        program: program.to_string(),
        status: "exit code 1".to_string(),
    }
}

#[test]
fn iteration_handles_events_then_one_work_item_then_one_error() {
    init_tracing();
    let mut h = LoopHarness::new();

    h.app.output().push("hello from mopidy");
    h.ui.push_signal(MENU_SERVER_OUTPUT, SIGNAL_ACTIVATE);
    h.app
        .post(|ui| ui.render_status(&StatusDisplay::new(StatusIcon::None, "first job")))
        .unwrap();
    h.app
        .post(|ui| ui.render_status(&StatusDisplay::new(StatusIcon::None, "second job")))
        .unwrap();
    h.app.report(exited("a"));

    assert!(h.main_loop.iterate().is_none());

    assert_eq!(
        h.ui.journal(),
        vec![
            UiCall::ShowOutput(vec!["hello from mopidy".to_string()]),
            UiCall::SetStatus(StatusIcon::None, "first job".to_string()),
            UiCall::ShowDialog(
                DialogHandle(1),
                DialogKind::Error,
                "a exited unexpectedly (exit code 1)".to_string()
            ),
            UiCall::SetControlsEnabled(false),
        ]
    );
    assert!(h.main_loop.showing_error());

    // The second job runs on the next pass.
    h.main_loop.iterate();
    assert_eq!(h.ui.statuses(), vec!["first job", "second job"]);
}

#[test]
fn queued_errors_wait_while_an_error_dialog_is_showing() {
    init_tracing();
    let mut h = LoopHarness::new();

    h.app.report(exited("a"));
    h.app.report(exited("b"));

    for _ in 0..5 {
        h.main_loop.iterate();
    }
    assert_eq!(h.ui.dialogs_shown().len(), 1);
    assert!(!h.ui.controls_enabled());

    h.ui.dismiss_oldest().unwrap();
    h.main_loop.iterate();

    let journal = h.ui.journal();
    assert_eq!(
        &journal[2..],
        &[
            UiCall::DestroyDialog(DialogHandle(1)),
            UiCall::SetControlsEnabled(true),
            UiCall::ShowDialog(
                DialogHandle(2),
                DialogKind::Error,
                "b exited unexpectedly (exit code 1)".to_string()
            ),
            UiCall::SetControlsEnabled(false),
        ]
    );
    assert_eq!(h.ui.max_visible_errors(), 1);

    h.ui.dismiss_oldest().unwrap();
    h.main_loop.iterate();
    assert!(!h.main_loop.showing_error());
    assert!(h.ui.controls_enabled());
    assert_eq!(h.ui.visible_dialogs(), 0);
}

#[test]
fn menu_items_send_supervisor_commands() {
    init_tracing();
    let mut h = LoopHarness::new();

    h.ui.push_signal(MENU_SERVER_START, SIGNAL_ACTIVATE);
    h.ui.push_signal(MENU_SERVER_RESTART, SIGNAL_ACTIVATE);
    h.ui.push_signal(MENU_SERVER_STOP, SIGNAL_ACTIVATE);
    h.ui.push_signal("some-widget", "clicked");
    h.main_loop.iterate();

    assert_eq!(
        h.sent_commands(),
        vec![
            SupervisorCommand::Start,
            SupervisorCommand::Restart,
            SupervisorCommand::Stop
        ]
    );
    assert!(h.app.is_running());
}

#[test]
fn process_controls_are_ignored_while_disabled() {
    init_tracing();
    let mut h = LoopHarness::new();

    h.app.report(exited("a"));
    h.main_loop.iterate();
    assert!(!h.ui.controls_enabled());

    h.ui.push_signal(MENU_SERVER_START, SIGNAL_ACTIVATE);
    h.ui.push_signal(MENU_SERVER_OUTPUT, SIGNAL_ACTIVATE);
    h.main_loop.iterate();
    assert!(h.sent_commands().is_empty());
    // Non-control actions still work.
    assert!(h.ui.journal().contains(&UiCall::ShowOutput(Vec::new())));

    h.ui.dismiss_oldest().unwrap();
    h.main_loop.iterate();
    h.ui.push_signal(MENU_SERVER_START, SIGNAL_ACTIVATE);
    h.main_loop.iterate();
    assert_eq!(h.sent_commands(), vec![SupervisorCommand::Start]);
}

#[test]
fn output_window_closes_on_delete_event() {
    let mut h = LoopHarness::new();

    h.ui.push_signal(OUTPUT_WINDOW, SIGNAL_DELETE_EVENT);
    h.main_loop.iterate();

    assert_eq!(h.ui.journal(), vec![UiCall::HideOutput]);
}

#[test]
fn quit_menu_ends_the_loop_and_tells_the_supervisor() {
    init_tracing();
    let mut h = LoopHarness::new();

    h.ui.push_signal(MENU_QUIT, SIGNAL_ACTIVATE);
    let exit = h.main_loop.run();

    assert_eq!(exit, LoopExit::Quit);
    assert!(!h.app.is_running());
    assert_eq!(h.commands.try_recv().ok(), Some(SupervisorCommand::Quit));
    assert!(!h.ui.state().loop_active);
}

#[test]
fn closing_the_main_window_quits() {
    let mut h = LoopHarness::new();

    h.ui.push_signal(MAIN_WINDOW, SIGNAL_DESTROY);
    assert_eq!(h.main_loop.run(), LoopExit::Quit);
    assert_eq!(h.commands.try_recv().ok(), Some(SupervisorCommand::Quit));
}

#[test]
fn loop_exits_when_quit_is_called_from_another_thread() {
    init_tracing();
    let h = LoopHarness::new();
    let app = h.app.clone();

    let quitter = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(20));
        app.quit();
    });

    assert_eq!(h.main_loop.run(), LoopExit::Quit);
    quitter.join().unwrap();
}

#[test]
fn fatal_while_running_ends_the_loop_after_dismissal() {
    init_tracing();
    let (toolkit, ui) = FakeUi::auto_dismissing();
    let h = LoopHarness::with_toolkit(toolkit, ui);

    h.app.fatal("the sky fell");
    let exit = h.main_loop.run();

    assert_eq!(exit, LoopExit::Fatal("the sky fell".to_string()));
    assert!(!h.app.is_running());
    assert_eq!(
        h.ui.dialogs_shown(),
        vec![(DialogKind::Fatal, "the sky fell".to_string())]
    );
    assert_eq!(h.ui.visible_dialogs(), 0);
}

#[test]
fn fatal_dialog_keeps_the_loop_alive_until_dismissed() {
    init_tracing();
    let mut h = LoopHarness::new();

    h.ui.state().loop_active = true;
    h.app.fatal("boom");
    for _ in 0..3 {
        assert!(h.main_loop.iterate().is_none());
    }
    assert_eq!(h.ui.visible_dialogs(), 1);

    h.ui.dismiss_oldest().unwrap();
    assert_eq!(
        h.main_loop.iterate(),
        Some(LoopExit::Fatal("boom".to_string()))
    );
}

#[test]
fn work_items_run_under_a_single_error_dialog() {
    init_tracing();
    let mut h = LoopHarness::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let observe = |app: &tether::app::Application, seen: &Arc<Mutex<Vec<bool>>>| {
        let seen = Arc::clone(seen);
        app.post(move |ui| seen.lock().unwrap().push(ui.showing_error()))
            .unwrap();
    };

    h.app.report(exited("a"));
    h.main_loop.iterate();
    h.app.report(exited("b"));
    h.app.report(exited("c"));
    observe(&h.app, &seen);
    h.main_loop.iterate();
    assert_eq!(h.ui.visible_dialogs(), 1);

    // Dismissing the first error brings up the next one in the same pass.
    h.ui.dismiss_oldest().unwrap();
    observe(&h.app, &seen);
    h.main_loop.iterate();
    assert_eq!(h.ui.visible_dialogs(), 1);
    assert!(!h.ui.controls_enabled());

    h.ui.dismiss_oldest().unwrap();
    h.main_loop.iterate();
    h.ui.dismiss_oldest().unwrap();
    observe(&h.app, &seen);
    h.main_loop.iterate();

    assert_eq!(*seen.lock().unwrap(), vec![true, false, false]);
    assert_eq!(h.ui.max_visible_errors(), 1);
    assert_eq!(h.ui.visible_dialogs(), 0);
    assert!(h.ui.controls_enabled());
    let messages: Vec<String> = h.ui.dialogs_shown().into_iter().map(|(_, m)| m).collect();
    assert_eq!(
        messages,
        vec![
            "a exited unexpectedly (exit code 1)".to_string(),
            "b exited unexpectedly (exit code 1)".to_string(),
            "c exited unexpectedly (exit code 1)".to_string(),
        ]
    );
}

#[test]
fn reporting_a_fatal_error_ends_the_loop() {
    init_tracing();
    let (toolkit, ui) = FakeUi::auto_dismissing();
    let h = LoopHarness::with_toolkit(toolkit, ui);

    h.app
        .report(TetherError::ConfigError("[process].command must not be empty".to_string()));
    let exit = h.main_loop.run();

    let message = "Configuration error: [process].command must not be empty".to_string();
    assert_eq!(exit, LoopExit::Fatal(message.clone()));
    assert_eq!(h.ui.dialogs_shown(), vec![(DialogKind::Fatal, message)]);
    assert_eq!(h.ui.max_visible_errors(), 0);
}
