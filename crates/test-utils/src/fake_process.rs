use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tether::errors::{Result, TetherError};
use tether::supervisor::{ExitInfo, OutputLog, ProbeFuture, ProcessHandle, ProcessLauncher, ReadinessProbe};

/// Test-side view of one fake process.
#[derive(Debug, Default)]
pub struct ProcessControl {
    exit: Mutex<Option<ExitInfo>>,
    terminated: Mutex<bool>,
}

impl ProcessControl {
    /// Make the process exit on its own with `code`.
    pub fn exit(&self, code: i32) {
        *self.exit.lock().unwrap() = Some(ExitInfo { code: Some(code) });
    }

    pub fn is_terminated(&self) -> bool {
        *self.terminated.lock().unwrap()
    }

    pub fn is_alive(&self) -> bool {
        self.exit.lock().unwrap().is_none()
    }
}

struct FakeProcess {
    pid: u32,
    control: Arc<ProcessControl>,
}

impl ProcessHandle for FakeProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn terminate(&mut self) -> io::Result<()> {
        *self.control.terminated.lock().unwrap() = true;
        let mut exit = self.control.exit.lock().unwrap();
        if exit.is_none() {
            *exit = Some(ExitInfo { code: None });
        }
        Ok(())
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitInfo>> {
        Ok(*self.control.exit.lock().unwrap())
    }
}

#[derive(Default)]
struct LauncherState {
    missing: HashSet<String>,
    fail_spawns: bool,
    output: Vec<String>,
    spawn_attempts: usize,
    processes: Vec<Arc<ProcessControl>>,
}

/// A [`ProcessLauncher`] that never touches the OS.
///
/// - every program resolves to `/usr/bin/<name>` unless marked missing
/// - spawns succeed unless `fail_spawns(true)`
/// - each spawned process can be made to exit via its [`ProcessControl`]
#[derive(Clone, Default)]
pub struct FakeLauncher {
    state: Arc<Mutex<LauncherState>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing(self, name: &str) -> Self {
        self.state.lock().unwrap().missing.insert(name.to_string());
        self
    }

    /// Lines written to the output log right after each spawn.
    pub fn with_output(self, lines: &[&str]) -> Self {
        self.state.lock().unwrap().output = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn fail_spawns(&self, fail: bool) {
        self.state.lock().unwrap().fail_spawns = fail;
    }

    pub fn spawn_attempts(&self) -> usize {
        self.state.lock().unwrap().spawn_attempts
    }

    pub fn spawned(&self) -> usize {
        self.state.lock().unwrap().processes.len()
    }

    pub fn process(&self, index: usize) -> Option<Arc<ProcessControl>> {
        self.state.lock().unwrap().processes.get(index).cloned()
    }

    pub fn last_process(&self) -> Option<Arc<ProcessControl>> {
        self.state.lock().unwrap().processes.last().cloned()
    }

    /// Processes spawned and neither exited nor killed.
    pub fn live_processes(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .processes
            .iter()
            .filter(|p| p.is_alive())
            .count()
    }
}

impl ProcessLauncher for FakeLauncher {
    fn lookup_executable(&self, name: &str) -> Result<PathBuf> {
        if self.state.lock().unwrap().missing.contains(name) {
            return Err(TetherError::DependencyMissing(name.to_string()));
        }
        Ok(Path::new("/usr/bin").join(name))
    }

    fn spawn(
        &self,
        path: &Path,
        _args: &[String],
        output: &OutputLog,
    ) -> Result<Box<dyn ProcessHandle>> {
        let mut state = self.state.lock().unwrap();
        state.spawn_attempts += 1;
        if state.fail_spawns {
            return Err(TetherError::SpawnFailed {
                program: path.display().to_string(),
                reason: "permission denied".to_string(),
            });
        }

        for line in &state.output {
            output.push(line.clone());
        }

        let control = Arc::new(ProcessControl::default());
        state.processes.push(Arc::clone(&control));
        let pid = 1000 + state.processes.len() as u32;
        Ok(Box::new(FakeProcess { pid, control }))
    }
}

/// What one readiness wait does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStep {
    Ready,
    Fail(String),
    /// Never resolves; only the supervisor's timeout ends it.
    Hang,
    /// Resolves `Ready` once [`ScriptedProbe::open_gate`] is called.
    Gated,
}

/// A [`ReadinessProbe`] playing back scripted steps, one per spawn, then
/// repeating `fallback`.
pub struct ScriptedProbe {
    steps: Mutex<VecDeque<ProbeStep>>,
    fallback: ProbeStep,
    calls: AtomicUsize,
    gate: Arc<Semaphore>,
}

impl ScriptedProbe {
    pub fn new(fallback: ProbeStep) -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            fallback,
            calls: AtomicUsize::new(0),
            gate: Arc::new(Semaphore::new(0)),
        }
    }

    pub fn ready() -> Self {
        Self::new(ProbeStep::Ready)
    }

    pub fn then(self, step: ProbeStep) -> Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    /// Let one gated wait complete.
    pub fn open_gate(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReadinessProbe for ScriptedProbe {
    fn wait_ready(&self) -> ProbeFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let gate = Arc::clone(&self.gate);

        Box::pin(async move {
            match step {
                ProbeStep::Ready => Ok(()),
                ProbeStep::Fail(reason) => Err(anyhow::anyhow!(reason)),
                ProbeStep::Hang => std::future::pending().await,
                ProbeStep::Gated => {
                    gate.acquire().await?.forget();
                    Ok(())
                }
            }
        })
    }
}
