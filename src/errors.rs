// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::plan::ValidationReport;

#[derive(Error, Debug)]
pub enum PlanwaveError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The plan failed structural validation; the report lists every issue.
    #[error("Invalid plan: {}", .0.summary())]
    InvalidPlan(ValidationReport),

    #[error("Step '{step_id}' references executor '{executor}' which cannot be resolved")]
    UnresolvedExecutor { step_id: String, executor: String },

    /// Internal scheduler invariant violated; aborts the whole run.
    #[error("Engine failure: {0}")]
    Engine(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PlanwaveError>;
