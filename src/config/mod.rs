// src/config/mod.rs

//! Engine and executor configuration (`Planwave.toml`).
//!
//! - [`model`] holds the raw TOML shape and the validated types.
//! - [`loader`] reads the file, optionally falling back to defaults.
//! - [`validate`] turns a [`RawConfigFile`] into a [`ConfigFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    default_config_path, load_and_validate, load_and_validate_with, load_from_path,
    load_from_path_with, load_or_default, load_or_default_with,
};
pub use model::{
    ConfigFile, DefaultSection, EngineConfig, EngineSection, ExecutorConfig, RawConfigFile,
};
