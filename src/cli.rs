// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tether`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tether",
    version,
    about = "Keep a long-running server process alive behind a small control window.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `~/.config/tether/tether.toml`. A missing default file means
    /// built-in defaults; a missing explicit file is an error.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Supervise this program instead of `[process].command`.
    #[arg(long, value_name = "PROGRAM")]
    pub command: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TETHER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the configuration, print it, but don't start anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
