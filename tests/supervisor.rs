// tests/supervisor.rs

mod common;
use crate::common::builders::ConfigFileBuilder;
use crate::common::fake_process::{FakeLauncher, ProbeStep, ScriptedProbe};
use crate::common::harness::{RunningSupervisor, SupervisorHarness};
use crate::common::{eventually, init_tracing, with_timeout};

use std::time::Duration;

use tokio::sync::mpsc;

use tether::config::ConfigFile;
use tether::supervisor::{ProcessStatus, SupervisorCommand};

fn config() -> ConfigFile {
    ConfigFileBuilder::new()
        .probe_timeout(Duration::from_millis(100))
        .liveness_interval(Duration::from_millis(10))
        .build()
}

fn running(launcher: FakeLauncher, probe: ScriptedProbe) -> RunningSupervisor {
    init_tracing();
    SupervisorHarness::new(&config(), launcher, probe).spawn()
}

#[tokio::test]
async fn start_spawns_and_connects() {
    let mut sup = running(FakeLauncher::new(), ScriptedProbe::ready());

    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Connected)).await;

    assert_eq!(sup.launcher.spawned(), 1);
    assert_eq!(sup.launcher.live_processes(), 1);
    assert_eq!(sup.probe.calls(), 1);
    assert!(sup.reported_errors().is_empty());
}

#[tokio::test]
async fn start_while_connecting_is_ignored() {
    let sup = running(
        FakeLauncher::new(),
        ScriptedProbe::new(ProbeStep::Gated),
    );

    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Connecting)).await;
    sup.send(SupervisorCommand::Start);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(sup.launcher.spawn_attempts(), 1);

    sup.probe.open_gate();
    with_timeout(sup.wait_for(ProcessStatus::Connected)).await;
    assert_eq!(sup.launcher.spawned(), 1);
}

#[tokio::test]
async fn rapid_restarts_leave_exactly_one_live_process() {
    let sup = running(FakeLauncher::new(), ScriptedProbe::ready());

    sup.send(SupervisorCommand::Start);
    for _ in 0..20 {
        sup.send(SupervisorCommand::Restart);
        assert!(sup.launcher.live_processes() <= 1);
        tokio::task::yield_now().await;
    }

    let launcher = sup.launcher.clone();
    with_timeout(eventually("all restarts processed", move || {
        launcher.spawn_attempts() == 21
    }))
    .await;
    with_timeout(sup.wait_for(ProcessStatus::Connected)).await;

    assert_eq!(sup.launcher.live_processes(), 1);
    for i in 0..20 {
        assert!(sup.launcher.process(i).unwrap().is_terminated());
    }
    assert_eq!(sup.status(), ProcessStatus::Connected);
}

#[tokio::test]
async fn failed_probe_kills_the_process_and_is_not_retried() {
    let mut sup = running(
        FakeLauncher::new(),
        ScriptedProbe::new(ProbeStep::Fail("connection refused".to_string())),
    );

    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Failed)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(sup.probe.calls(), 1);
    assert_eq!(sup.launcher.spawn_attempts(), 1);
    assert!(sup.launcher.last_process().unwrap().is_terminated());
    assert_eq!(
        sup.reported_errors(),
        vec!["mopidy did not become ready: connection refused".to_string()]
    );
    assert_eq!(sup.status(), ProcessStatus::Failed);
}

#[tokio::test]
async fn probe_timeout_marks_the_process_failed() {
    let mut sup = running(FakeLauncher::new(), ScriptedProbe::new(ProbeStep::Hang));

    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Failed)).await;

    assert_eq!(
        sup.reported_errors(),
        vec!["mopidy did not become ready within 100ms".to_string()]
    );
    assert_eq!(sup.launcher.live_processes(), 0);
}

#[tokio::test]
async fn restart_after_failure_connects() {
    let sup = running(
        FakeLauncher::new(),
        ScriptedProbe::ready().then(ProbeStep::Fail("not yet".to_string())),
    );

    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Failed)).await;

    sup.send(SupervisorCommand::Restart);
    with_timeout(sup.wait_for(ProcessStatus::Connected)).await;
    assert_eq!(sup.launcher.spawned(), 2);
    assert_eq!(sup.launcher.live_processes(), 1);
}

#[tokio::test]
async fn stop_kills_the_process() {
    let sup = running(FakeLauncher::new(), ScriptedProbe::ready());

    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Connected)).await;
    sup.send(SupervisorCommand::Stop);
    with_timeout(sup.wait_for(ProcessStatus::NotStarted)).await;

    assert!(sup.launcher.last_process().unwrap().is_terminated());
    assert_eq!(sup.launcher.live_processes(), 0);
}

#[tokio::test]
async fn stop_during_probe_abandons_it() {
    let sup = running(FakeLauncher::new(), ScriptedProbe::new(ProbeStep::Gated));

    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Connecting)).await;
    sup.send(SupervisorCommand::Stop);
    with_timeout(sup.wait_for(ProcessStatus::NotStarted)).await;

    sup.probe.open_gate();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sup.status(), ProcessStatus::NotStarted);
}

#[tokio::test]
async fn unexpected_exit_is_reported_once() {
    let mut sup = running(FakeLauncher::new(), ScriptedProbe::ready());

    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Connected)).await;

    sup.launcher.last_process().unwrap().exit(3);
    with_timeout(sup.wait_for(ProcessStatus::Failed)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(
        sup.reported_errors(),
        vec!["mopidy exited unexpectedly (exit code 3)".to_string()]
    );
}

#[tokio::test]
async fn spawn_failure_is_recoverable() {
    let launcher = FakeLauncher::new();
    launcher.fail_spawns(true);
    let mut sup = running(launcher, ScriptedProbe::ready());

    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Failed)).await;
    assert_eq!(
        sup.reported_errors(),
        vec!["Failed to launch /usr/bin/mopidy: permission denied".to_string()]
    );

    sup.launcher.fail_spawns(false);
    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Connected)).await;
    assert_eq!(sup.launcher.spawn_attempts(), 2);
}

#[tokio::test]
async fn output_is_captured_per_spawn() {
    let sup = running(
        FakeLauncher::new().with_output(&["listening on 6680", "ready"]),
        ScriptedProbe::ready(),
    );

    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Connected)).await;
    sup.send(SupervisorCommand::Restart);
    let launcher = sup.launcher.clone();
    with_timeout(eventually("second spawn", move || launcher.spawned() == 2)).await;

    assert_eq!(
        sup.app.output().snapshot(),
        vec!["listening on 6680".to_string(), "ready".to_string()]
    );
}

#[tokio::test]
async fn quit_terminates_and_stops_the_application() {
    let sup = running(FakeLauncher::new(), ScriptedProbe::ready());

    sup.send(SupervisorCommand::Start);
    with_timeout(sup.wait_for(ProcessStatus::Connected)).await;
    sup.app.quit();

    with_timeout(sup.task).await.unwrap();
    assert!(!sup.app.is_running());
    assert!(sup.launcher.last_process().unwrap().is_terminated());
}

#[tokio::test]
async fn restart_from_not_started_goes_through_connecting() {
    let sup = running(FakeLauncher::new(), ScriptedProbe::new(ProbeStep::Gated));
    assert_eq!(sup.status(), ProcessStatus::NotStarted);

    sup.send(SupervisorCommand::Restart);
    with_timeout(sup.wait_for(ProcessStatus::Connecting)).await;

    sup.probe.open_gate();
    with_timeout(sup.wait_for(ProcessStatus::Connected)).await;
    assert_eq!(sup.launcher.spawned(), 1);
}

#[tokio::test]
async fn failed_restart_waits_for_the_next_explicit_restart() {
    let sup = running(
        FakeLauncher::new(),
        ScriptedProbe::new(ProbeStep::Fail("refused".to_string())),
    );

    sup.send(SupervisorCommand::Restart);
    with_timeout(sup.wait_for(ProcessStatus::Failed)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sup.launcher.spawn_attempts(), 1);
    assert_eq!(sup.status(), ProcessStatus::Failed);

    sup.send(SupervisorCommand::Restart);
    let launcher = sup.launcher.clone();
    with_timeout(eventually("second attempt", move || launcher.spawn_attempts() == 2)).await;
    with_timeout(sup.wait_for(ProcessStatus::Failed)).await;
}

#[tokio::test]
async fn closing_a_private_command_channel_stops_the_process() {
    init_tracing();
    let harness = SupervisorHarness::new(&config(), FakeLauncher::new(), ScriptedProbe::ready());
    let app = harness.app.clone();
    let launcher = harness.launcher.clone();
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(harness.supervisor.run(rx));

    tx.send(SupervisorCommand::Start).unwrap();
    let watched = app.clone();
    with_timeout(eventually("connected", move || {
        watched.status() == ProcessStatus::Connected
    }))
    .await;

    drop(tx);
    with_timeout(task).await.unwrap();

    assert_eq!(app.status(), ProcessStatus::NotStarted);
    assert!(launcher.last_process().unwrap().is_terminated());
    // Only Quit ends the application.
    assert!(app.is_running());
}
