// src/config/loader.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, TetherError};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => TetherError::ConfigNotFound(path.to_path_buf()),
        _ => TetherError::IoError(e),
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), "loaded configuration");

    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// This is the entry point for the rest of the application; a failure here
/// is fatal at startup.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `~/.config/tether/tether.toml`.
///
/// Fails with [`TetherError::HomeDirUnavailable`] if the current user's home
/// directory cannot be determined.
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(TetherError::HomeDirUnavailable)?;
    Ok(config_path_in(&home))
}

/// Location of the config file below a given home directory.
pub fn config_path_in(home: &Path) -> PathBuf {
    home.join(".config").join("tether").join("tether.toml")
}
