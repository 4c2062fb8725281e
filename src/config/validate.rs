// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TetherError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TetherError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.process, raw.probe, raw.supervisor))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_process(cfg)?;
    validate_probe(cfg)?;
    validate_supervisor(cfg)?;
    Ok(())
}

fn validate_process(cfg: &RawConfigFile) -> Result<()> {
    if cfg.process.command.trim().is_empty() {
        return Err(TetherError::ConfigError(
            "[process].command must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_probe(cfg: &RawConfigFile) -> Result<()> {
    // kind and address are strongly typed and validated during
    // deserialization; only the durations need checking here.
    ensure_positive("[probe].timeout", cfg.probe.timeout)?;
    ensure_positive("[probe].interval", cfg.probe.interval)?;

    if cfg.probe.interval > cfg.probe.timeout {
        return Err(TetherError::ConfigError(format!(
            "[probe].interval ({}) must not exceed [probe].timeout ({})",
            humantime::format_duration(cfg.probe.interval),
            humantime::format_duration(cfg.probe.timeout),
        )));
    }

    Ok(())
}

fn validate_supervisor(cfg: &RawConfigFile) -> Result<()> {
    ensure_positive("[supervisor].liveness_interval", cfg.supervisor.liveness_interval)?;

    if cfg.supervisor.output_lines == 0 {
        return Err(TetherError::ConfigError(
            "[supervisor].output_lines must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn ensure_positive(field: &str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(TetherError::ConfigError(format!(
            "{field} must be greater than zero"
        )));
    }
    Ok(())
}
