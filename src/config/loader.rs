// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};

/// Read and deserialize a config file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    load_from_path_with(&RealFileSystem, path)
}

pub fn load_from_path_with(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs.read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load and validate a config file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    load_and_validate_with(&RealFileSystem, path)
}

pub fn load_and_validate_with(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw = load_from_path_with(fs, path)?;
    ConfigFile::try_from(raw)
}

/// Like [`load_and_validate_with`], but a missing file yields the default
/// configuration. The config file is optional; a plan can run with
/// registry defaults alone.
pub fn load_or_default_with(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !fs.exists(path) {
        info!(path = %path.display(), "no config file found; using defaults");
        return Ok(ConfigFile::default());
    }
    debug!(path = %path.display(), "loading config");
    load_and_validate_with(fs, path)
}

pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    load_or_default_with(&RealFileSystem, path)
}

/// `Planwave.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Planwave.toml")
}
