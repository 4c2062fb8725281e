use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tether::app::Application;
use tether::config::ConfigFile;
use tether::dispatch::{error_channel, work_channel, ErrorQueue, WorkQueue};
use tether::supervisor::{
    supervisor_channel, OutputLog, ProcessStatus, ProcessSupervisor, SupervisorCommand,
    SupervisorOptions,
};
use tether::ui::{MainLoop, UiContext};

use crate::fake_process::{FakeLauncher, ScriptedProbe};
use crate::fake_ui::{FakeUi, FakeUiHandle};

pub const PROGRAM: &str = "mopidy";

/// An [`Application`] wired to a [`FakeUi`]-driven [`MainLoop`].
///
/// The supervisor side is just the command receiver, so tests can see which
/// commands the UI sent.
pub struct LoopHarness {
    pub app: Application,
    pub main_loop: MainLoop,
    pub ui: FakeUiHandle,
    pub commands: mpsc::UnboundedReceiver<SupervisorCommand>,
}

impl LoopHarness {
    pub fn new() -> Self {
        let (toolkit, ui) = FakeUi::new();
        Self::with_toolkit(toolkit, ui)
    }

    pub fn with_toolkit(toolkit: FakeUi, ui: FakeUiHandle) -> Self {
        let (work, work_queue) = work_channel();
        let (errors, error_queue) = error_channel();
        let (supervisor, commands) = supervisor_channel();
        let app = Application::new(PROGRAM, work, errors, supervisor, OutputLog::new(100));
        let main_loop = MainLoop::new(
            UiContext::new(Box::new(toolkit)),
            app.clone(),
            work_queue,
            error_queue,
        );
        Self {
            app,
            main_loop,
            ui,
            commands,
        }
    }

    /// Commands the UI has sent to the supervisor so far.
    pub fn sent_commands(&mut self) -> Vec<SupervisorCommand> {
        let mut sent = Vec::new();
        while let Ok(cmd) = self.commands.try_recv() {
            sent.push(cmd);
        }
        sent
    }
}

impl Default for LoopHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`ProcessSupervisor`] over a [`FakeLauncher`] and a [`ScriptedProbe`],
/// with the queues it feeds kept for inspection.
pub struct SupervisorHarness {
    pub app: Application,
    pub supervisor: ProcessSupervisor,
    pub launcher: FakeLauncher,
    pub probe: Arc<ScriptedProbe>,
    pub work_queue: WorkQueue,
    pub error_queue: ErrorQueue,
    pub commands: mpsc::UnboundedReceiver<SupervisorCommand>,
}

impl SupervisorHarness {
    pub fn new(config: &ConfigFile, launcher: FakeLauncher, probe: ScriptedProbe) -> Self {
        let (work, work_queue) = work_channel();
        let (errors, error_queue) = error_channel();
        let (handle, commands) = supervisor_channel();
        let app = Application::new(
            PROGRAM,
            work,
            errors,
            handle,
            OutputLog::new(config.supervisor.output_lines),
        );
        let probe = Arc::new(probe);
        let supervisor = ProcessSupervisor::new(
            app.clone(),
            Arc::new(launcher.clone()),
            probe.clone(),
            PathBuf::from("/usr/bin").join(PROGRAM),
            config.process.args.clone(),
            SupervisorOptions::from_config(config),
        );
        Self {
            app,
            supervisor,
            launcher,
            probe,
            work_queue,
            error_queue,
            commands,
        }
    }

    /// Errors reported so far, as displayed.
    pub fn reported_errors(&mut self) -> Vec<String> {
        drain_errors(&mut self.error_queue)
    }

    /// Run the actor on the current Tokio runtime.
    pub fn spawn(self) -> RunningSupervisor {
        let task = tokio::spawn(self.supervisor.run(self.commands));
        RunningSupervisor {
            app: self.app,
            launcher: self.launcher,
            probe: self.probe,
            work_queue: self.work_queue,
            error_queue: self.error_queue,
            task,
        }
    }
}

/// A supervisor actor running as a Tokio task.
pub struct RunningSupervisor {
    pub app: Application,
    pub launcher: FakeLauncher,
    pub probe: Arc<ScriptedProbe>,
    pub work_queue: WorkQueue,
    pub error_queue: ErrorQueue,
    pub task: JoinHandle<()>,
}

impl RunningSupervisor {
    pub fn send(&self, command: SupervisorCommand) {
        self.app.send(command);
    }

    pub fn status(&self) -> ProcessStatus {
        self.app.status()
    }

    pub async fn wait_for(&self, status: ProcessStatus) {
        let app = self.app.clone();
        crate::eventually(&format!("status {status}"), move || app.status() == status).await;
    }

    pub fn reported_errors(&mut self) -> Vec<String> {
        drain_errors(&mut self.error_queue)
    }
}

fn drain_errors(queue: &mut ErrorQueue) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(err) = queue.try_next() {
        out.push(err.to_string());
    }
    out
}
