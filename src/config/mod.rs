// src/config/mod.rs

//! Configuration loading.
//!
//! - [`model`]: serde data model of the TOML file.
//! - [`loader`]: reading files and resolving the default location.
//! - [`validate`]: semantic checks turning a `RawConfigFile` into a
//!   `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_path_in, default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ProbeSection, ProcessSection, RawConfigFile, SupervisorSection};
