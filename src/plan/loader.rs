// src/plan/loader.rs

use std::path::Path;

use tracing::debug;

use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::plan::model::Plan;

/// Document formats a plan can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Json,
    Toml,
}

impl PlanFormat {
    /// `.json` files are JSON; everything else is treated as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => PlanFormat::Json,
            _ => PlanFormat::Toml,
        }
    }
}

/// Parse a plan document from a string.
///
/// This only performs deserialization; structural checks live in
/// [`crate::plan::validate_plan`].
pub fn parse_plan(contents: &str, format: PlanFormat) -> Result<Plan> {
    let plan = match format {
        PlanFormat::Json => serde_json::from_str(contents)?,
        PlanFormat::Toml => toml::from_str(contents)?,
    };
    Ok(plan)
}

/// Load a plan document from disk.
pub fn load_plan(path: impl AsRef<Path>) -> Result<Plan> {
    load_plan_with(&RealFileSystem, path)
}

/// Load a plan document through the given filesystem.
pub fn load_plan_with(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Plan> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path)?;
    let plan = parse_plan(&contents, PlanFormat::from_path(path))?;
    debug!(
        plan_id = %plan.id,
        steps = plan.steps.len(),
        path = %path.display(),
        "loaded plan document"
    );
    Ok(plan)
}
