#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use tether::cli::CliArgs;
use tether::config::{ConfigFile, RawConfigFile};
use tether::types::ProbeKind;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults with the probe switched to `none` and
/// short intervals, so tests never wait on a real port.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.probe.kind = ProbeKind::None;
        config.probe.timeout = Duration::from_millis(500);
        config.probe.interval = Duration::from_millis(10);
        config.supervisor.liveness_interval = Duration::from_millis(20);
        config.supervisor.autostart = false;
        Self { config }
    }

    pub fn command(mut self, command: &str) -> Self {
        self.config.process.command = command.to_string();
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.process.args.push(arg.to_string());
        self
    }

    pub fn probe_kind(mut self, kind: ProbeKind) -> Self {
        self.config.probe.kind = kind;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe.timeout = timeout;
        self
    }

    pub fn liveness_interval(mut self, interval: Duration) -> Self {
        self.config.supervisor.liveness_interval = interval;
        self
    }

    pub fn output_lines(mut self, lines: usize) -> Self {
        self.config.supervisor.output_lines = lines;
        self
    }

    pub fn autostart(mut self, on: bool) -> Self {
        self.config.supervisor.autostart = on;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Command-line arguments pointing at an explicit config file.
pub fn cli_args(config: &Path) -> CliArgs {
    CliArgs {
        config: Some(config.to_path_buf()),
        command: None,
        log_level: None,
        dry_run: false,
    }
}
