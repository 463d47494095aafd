// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::{ConfigFile, EngineConfig, EngineSection, ExecutorConfig, RawConfigFile};
use crate::errors::{PlanwaveError, Result};
use crate::plan::ExecutorRef;
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PlanwaveError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let engine = validate_engine(&raw.engine)?;
        let executors = validate_executors(raw.executor)?;
        Ok(ConfigFile::new_unchecked(engine, executors, raw.default))
    }
}

fn validate_engine(section: &EngineSection) -> Result<EngineConfig> {
    let step_timeout = section
        .step_timeout
        .as_deref()
        .map(|s| duration_field("step_timeout", s))
        .transpose()?;
    if step_timeout == Some(Duration::ZERO) {
        return Err(PlanwaveError::ConfigError(
            "[engine].step_timeout must be greater than zero".to_string(),
        ));
    }

    let step_delay = section
        .step_delay
        .as_deref()
        .map(|s| duration_field("step_delay", s))
        .transpose()?
        .unwrap_or(Duration::ZERO);

    Ok(EngineConfig {
        step_timeout,
        step_delay,
        on_dependency_failure: section.on_dependency_failure,
    })
}

fn duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| PlanwaveError::ConfigError(format!("[engine].{field}: {e}")))
}

fn validate_executors(
    raw: BTreeMap<String, ExecutorConfig>,
) -> Result<BTreeMap<ExecutorRef, ExecutorConfig>> {
    let mut out = BTreeMap::new();
    for (key, exec) in raw {
        let reference: ExecutorRef = key
            .parse()
            .map_err(|e| PlanwaveError::ConfigError(format!("[executor.\"{key}\"]: {e}")))?;

        if exec.cmd.trim().is_empty() {
            return Err(PlanwaveError::ConfigError(format!(
                "[executor.\"{key}\"].cmd must not be empty"
            )));
        }

        if out.insert(reference.clone(), exec).is_some() {
            return Err(PlanwaveError::ConfigError(format!(
                "executor '{reference}' is configured more than once"
            )));
        }
    }
    Ok(out)
}
