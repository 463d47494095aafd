// src/fs/mod.rs

//! Minimal filesystem seam used by the plan and config loaders.

use std::fmt::Debug;
use std::fs;
use std::path::Path;

use crate::errors::Result;

pub mod mock;

pub use mock::MockFileSystem;

/// Read-only view of the filesystem needed to load documents.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
