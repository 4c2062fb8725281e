// tests/status_atomicity.rs

mod common;
use crate::common::fake_ui::UiCall;
use crate::common::harness::LoopHarness;
use crate::common::init_tracing;

use std::thread;

use tether::supervisor::{ProcessStatus, StatusEvent};
use tether::types::StatusIcon;

const ALL: [ProcessStatus; 4] = [
    ProcessStatus::NotStarted,
    ProcessStatus::Connecting,
    ProcessStatus::Connected,
    ProcessStatus::Failed,
];

#[test]
fn concurrent_set_status_never_renders_a_mismatched_label() {
    init_tracing();
    let mut h = LoopHarness::new();
    let threads = 4;
    let per_thread = 50;

    let writers: Vec<_> = (0..threads)
        .map(|t| {
            let app = h.app.clone();
            thread::spawn(move || {
                for i in 0..per_thread {
                    app.set_status(ALL[(t + i) % ALL.len()]);
                }
            })
        })
        .collect();

    // Render while the writers are still going.
    while writers.iter().any(|w| !w.is_finished()) {
        h.main_loop.iterate();
    }
    for w in writers {
        w.join().unwrap();
    }
    for _ in 0..(threads * per_thread + 10) {
        h.main_loop.iterate();
    }

    let renders: Vec<(StatusIcon, String)> = h
        .ui
        .journal()
        .into_iter()
        .filter_map(|call| match call {
            UiCall::SetStatus(icon, text) => Some((icon, text)),
            _ => None,
        })
        .collect();
    assert_eq!(renders.len(), threads * per_thread);

    // Icon and text always come from the same status.
    for (icon, text) in &renders {
        let matching = ALL
            .iter()
            .map(|s| s.display("mopidy"))
            .find(|d| d.text == *text)
            .expect("rendered text belongs to some status");
        assert_eq!(matching.icon, *icon);
    }

    // The label ends up on the stored status.
    let cell = h.app.status_snapshot();
    assert_eq!(cell.display, cell.status.display("mopidy"));
    let (icon, text) = renders.last().unwrap();
    assert_eq!(*icon, cell.display.icon);
    assert_eq!(*text, cell.display.text);
}

#[test]
fn rejected_events_leave_status_and_label_untouched() {
    let mut h = LoopHarness::new();

    assert!(h.app.apply_status_event(StatusEvent::ProbeSucceeded).is_err());
    assert_eq!(h.app.status(), ProcessStatus::NotStarted);

    assert_eq!(
        h.app.apply_status_event(StatusEvent::Spawned).unwrap(),
        ProcessStatus::Connecting
    );
    h.main_loop.iterate();
    assert_eq!(h.ui.statuses(), vec!["Connecting...".to_string()]);
}
