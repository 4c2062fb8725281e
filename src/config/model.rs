// src/config/model.rs

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use serde::Deserialize;

use crate::types::ProbeKind;

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [process]
/// command = "mopidy"
/// args = ["-o", "http/port=6680"]
///
/// [probe]
/// kind = "tcp"
/// address = "127.0.0.1:6680"
/// timeout = "10s"
/// interval = "250ms"
///
/// [supervisor]
/// liveness_interval = "1s"
/// output_lines = 500
/// autostart = true
/// ```
///
/// All sections are optional and have reasonable defaults. Convert into a
/// [`ConfigFile`] (via `TryFrom`) to validate it.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub process: ProcessSection,

    #[serde(default)]
    pub probe: ProbeSection,

    #[serde(default)]
    pub supervisor: SupervisorSection,
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)` (or
/// [`crate::config::load_and_validate`]), so holding one means the values
/// passed validation.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub process: ProcessSection,
    pub probe: ProbeSection,
    pub supervisor: SupervisorSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        process: ProcessSection,
        probe: ProbeSection,
        supervisor: SupervisorSection,
    ) -> Self {
        Self {
            process,
            probe,
            supervisor,
        }
    }
}

/// `[process]` section: what to supervise.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessSection {
    /// Program name looked up on `PATH`, or a path to it.
    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default)]
    pub args: Vec<String>,
}

fn default_command() -> String {
    "mopidy".to_string()
}

impl Default for ProcessSection {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
        }
    }
}

/// `[probe]` section: how readiness is decided after each spawn.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeSection {
    #[serde(default)]
    pub kind: ProbeKind,

    /// Address polled by the `tcp` probe.
    #[serde(default = "default_probe_address")]
    pub address: SocketAddr,

    /// Give up and mark the process `Failed` after this long.
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Delay between probe attempts.
    #[serde(default = "default_probe_interval", with = "humantime_serde")]
    pub interval: Duration,
}

fn default_probe_address() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 6680))
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_probe_interval() -> Duration {
    Duration::from_millis(250)
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            kind: ProbeKind::default(),
            address: default_probe_address(),
            timeout: default_probe_timeout(),
            interval: default_probe_interval(),
        }
    }
}

/// `[supervisor]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorSection {
    /// How often a running process is checked for an unexpected exit.
    #[serde(default = "default_liveness_interval", with = "humantime_serde")]
    pub liveness_interval: Duration,

    /// Number of output lines kept for the output window.
    #[serde(default = "default_output_lines")]
    pub output_lines: usize,

    /// Start the process as soon as the window is up.
    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

fn default_liveness_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_output_lines() -> usize {
    500
}

fn default_autostart() -> bool {
    true
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            liveness_interval: default_liveness_interval(),
            output_lines: default_output_lines(),
            autostart: default_autostart(),
        }
    }
}
