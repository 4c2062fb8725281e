// src/lib.rs

pub mod app;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod logging;
pub mod supervisor;
pub mod types;
pub mod ui;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use crate::app::Application;
use crate::cli::CliArgs;
use crate::config::{default_config_path, load_from_path, ConfigFile, RawConfigFile};
use crate::dispatch::{error_channel, work_channel};
use crate::errors::TetherError;
use crate::supervisor::{
    probe_from_config, supervisor_channel, OutputLog, ProcessLauncher, ProcessSupervisor,
    SupervisorCommand, SupervisorOptions, SystemLauncher,
};
use crate::ui::{ConsoleUi, LoopExit, MainLoop, UiContext, UiToolkit};

/// How long teardown waits for the supervisor and the runtime to wind down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Everything resolved before the main loop starts.
#[derive(Debug, Clone)]
pub struct Startup {
    pub config: ConfigFile,
    /// Absolute path of the supervised program.
    pub executable: PathBuf,
}

/// High-level entry point used by `main.rs`.
///
/// Runs on the calling thread, which becomes the UI-affine thread. Returns an
/// error (and the binary exits non-zero) after a startup failure or a
/// dismissed fatal dialog.
pub fn run(args: CliArgs) -> Result<()> {
    if args.dry_run {
        let config = resolve_config(&args)?;
        print_dry_run(&config, &SystemLauncher);
        return Ok(());
    }

    let toolkit = ConsoleUi::new()?;
    match run_with(&args, Box::new(toolkit), Arc::new(SystemLauncher))? {
        LoopExit::Quit => Ok(()),
        LoopExit::Fatal(message) => Err(anyhow!(message)),
    }
}

/// Wire the application around a given toolkit and launcher and run the main
/// loop until it exits.
///
/// - startup (home dir, config, executable lookup); failures are shown with
///   a fatal dialog before the loop exists and returned as errors
/// - Tokio runtime with the supervisor actor and the Ctrl-C listener
/// - optional autostart of the process
/// - teardown: the process is terminated whatever the exit reason
pub fn run_with(
    args: &CliArgs,
    toolkit: Box<dyn UiToolkit>,
    launcher: Arc<dyn ProcessLauncher>,
) -> Result<LoopExit> {
    let mut ui = UiContext::new(toolkit);

    let startup = match bootstrap(args, launcher.as_ref()) {
        Ok(startup) => startup,
        Err(err) => {
            ui.fatal(&err);
            return Err(err.into());
        }
    };
    let cfg = &startup.config;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tether-worker")
        .build()?;

    let (work, work_queue) = work_channel();
    let (errors, error_queue) = error_channel();
    let (supervisor_handle, commands) = supervisor_channel();
    let output = OutputLog::new(cfg.supervisor.output_lines);

    let app = Application::new(
        program_name(&cfg.process.command),
        work,
        errors,
        supervisor_handle,
        output,
    );

    let supervisor = ProcessSupervisor::new(
        app.clone(),
        launcher,
        probe_from_config(&cfg.probe),
        startup.executable.clone(),
        cfg.process.args.clone(),
        SupervisorOptions::from_config(cfg),
    );
    let supervisor_task = rt.spawn(supervisor.run(commands));

    // Ctrl-C → Quit.
    {
        let app = app.clone();
        rt.spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received");
            app.quit();
        });
    }

    ui.render_status(&app.status_snapshot().display);

    if cfg.supervisor.autostart {
        info!(program = %app.program(), "autostart enabled; starting process");
        app.send(SupervisorCommand::Start);
    }

    let exit = MainLoop::new(ui, app.clone(), work_queue, error_queue).run();

    // Whatever ended the loop, make sure the process goes with it.
    app.quit();
    let joined = rt.block_on(async { tokio::time::timeout(SHUTDOWN_GRACE, supervisor_task).await });
    if joined.is_err() {
        warn!("supervisor did not stop in time");
    }
    rt.shutdown_timeout(SHUTDOWN_GRACE);

    Ok(exit)
}

/// Resolve the configuration, then the executable it names.
///
/// The home directory is needed to locate the default config file, so it is
/// resolved first; the executable name comes from the config.
pub fn bootstrap(args: &CliArgs, launcher: &dyn ProcessLauncher) -> errors::Result<Startup> {
    let config = resolve_config(args)?;
    let executable = launcher.lookup_executable(&config.process.command)?;
    info!(
        program = %config.process.command,
        executable = %executable.display(),
        "startup complete"
    );
    Ok(Startup { config, executable })
}

/// Load the configuration named on the command line, or the default one.
///
/// A missing *default* file means built-in defaults; a missing explicit
/// `--config` file is an error. `--command` overrides `[process].command`
/// before validation.
pub fn resolve_config(args: &CliArgs) -> errors::Result<ConfigFile> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => {
            let path = default_config_path()?;
            match load_from_path(&path) {
                Ok(raw) => raw,
                Err(TetherError::ConfigNotFound(path)) => {
                    debug!(path = %path.display(), "no config file; using defaults");
                    RawConfigFile::default()
                }
                Err(e) => return Err(e),
            }
        }
    };

    if let Some(command) = &args.command {
        raw.process.command = command.clone();
    }

    ConfigFile::try_from(raw)
}

/// Name shown in the status label: the file name of the configured command.
fn program_name(command: &str) -> String {
    Path::new(command)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| command.to_string())
}

/// Simple dry-run output: print the resolved configuration.
fn print_dry_run(cfg: &ConfigFile, launcher: &dyn ProcessLauncher) {
    println!("tether dry-run");
    println!("  process.command = {}", cfg.process.command);
    match launcher.lookup_executable(&cfg.process.command) {
        Ok(path) => println!("  process.executable = {}", path.display()),
        Err(e) => println!("  process.executable = <{e}>"),
    }
    if !cfg.process.args.is_empty() {
        println!("  process.args = {:?}", cfg.process.args);
    }
    println!();

    println!("  probe.kind = {:?}", cfg.probe.kind);
    println!("  probe.address = {}", cfg.probe.address);
    println!(
        "  probe.timeout = {}",
        humantime::format_duration(cfg.probe.timeout)
    );
    println!(
        "  probe.interval = {}",
        humantime::format_duration(cfg.probe.interval)
    );
    println!();

    println!(
        "  supervisor.liveness_interval = {}",
        humantime::format_duration(cfg.supervisor.liveness_interval)
    );
    println!("  supervisor.output_lines = {}", cfg.supervisor.output_lines);
    println!("  supervisor.autostart = {}", cfg.supervisor.autostart);

    debug!("dry-run complete (nothing started)");
}

#[cfg(test)]
mod tests {
    use super::program_name;

    #[test]
    fn program_name_strips_directories() {
        assert_eq!(program_name("/usr/bin/mopidy"), "mopidy");
        assert_eq!(program_name("mopidy"), "mopidy");
    }
}
