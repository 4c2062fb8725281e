// tests/work_dispatch.rs

mod common;
use crate::common::fake_ui::UiCall;
use crate::common::harness::LoopHarness;
use crate::common::init_tracing;

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use tether::errors::TetherError;
use tether::supervisor::StatusDisplay;
use tether::types::StatusIcon;

type TestResult = Result<(), Box<dyn Error>>;

/// Iterate the loop until `done` holds (or fail after 5 seconds).
fn pump_until(h: &mut LoopHarness, mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "loop did not reach the expected state");
        h.main_loop.iterate();
    }
}

#[test]
fn do_returns_after_the_closure_ran_on_the_ui_thread() -> TestResult {
    init_tracing();
    let mut h = LoopHarness::new();
    let app = h.app.clone();
    let ui = h.ui.clone();
    let ui_thread = thread::current().id();

    let worker = thread::spawn(move || {
        let result = app.run_on_ui(move |ctx| {
            ctx.render_status(&StatusDisplay::new(StatusIcon::None, "from worker"));
            assert_eq!(thread::current().id(), ui_thread);
            42
        });
        // The effect is visible as soon as Do returns.
        let seen = ui
            .journal()
            .contains(&UiCall::SetStatus(StatusIcon::None, "from worker".to_string()));
        (result, seen)
    });

    pump_until(&mut h, || worker.is_finished());
    let (result, seen) = worker.join().map_err(|_| "worker panicked")?;
    assert_eq!(result?, 42);
    assert!(seen);
    Ok(())
}

#[test]
fn async_do_from_a_tokio_task() -> TestResult {
    init_tracing();
    let mut h = LoopHarness::new();
    let app = h.app.clone();

    let worker = thread::spawn(move || -> tether::errors::Result<usize> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(async move { app.run_on_ui_async(|ctx| ctx.open_dialogs() + 7).await })
    });

    pump_until(&mut h, || worker.is_finished());
    let value = worker.join().map_err(|_| "worker panicked")??;
    assert_eq!(value, 7);
    Ok(())
}

#[test]
fn do_after_the_loop_is_gone_fails_instead_of_blocking() {
    init_tracing();
    let h = LoopHarness::new();
    let app = h.app.clone();
    drop(h.main_loop);

    let result = app.run_on_ui(|_| ());
    assert!(matches!(result, Err(TetherError::ShutdownInProgress)));
    assert!(matches!(app.post(|_| ()), Err(TetherError::ShutdownInProgress)));
}

#[test]
fn waiting_callers_are_released_when_the_loop_exits() {
    init_tracing();
    let h = LoopHarness::new();
    let app = h.app.clone();

    let worker = thread::spawn(move || app.run_on_ui(|_| "never runs"));
    thread::sleep(Duration::from_millis(50));

    // Quit before the queued item gets a chance to run.
    h.app.stop_running();
    h.main_loop.run();

    let result = worker.join().unwrap();
    assert!(matches!(result, Err(TetherError::ShutdownInProgress)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn work_items_from_one_thread_run_in_order(threads in 1usize..4, per_thread in 1usize..30) {
        let mut h = LoopHarness::new();
        let ran: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));

        let producers: Vec<_> = (0..threads)
            .map(|t| {
                let app = h.app.clone();
                let ran = Arc::clone(&ran);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        let ran = Arc::clone(&ran);
                        app.post(move |_| ran.lock().unwrap().push((t, i))).unwrap();
                    }
                })
            })
            .collect();

        let total = threads * per_thread;
        pump_until(&mut h, || ran.lock().unwrap().len() == total);
        for p in producers {
            p.join().unwrap();
        }

        let ran = ran.lock().unwrap();
        for t in 0..threads {
            let order: Vec<usize> = ran.iter().filter(|(tt, _)| *tt == t).map(|(_, i)| *i).collect();
            prop_assert_eq!(order, (0..per_thread).collect::<Vec<_>>());
        }
    }
}
