// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::plan::ExecutorRef;
use crate::types::DependencyFailurePolicy;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [engine]
/// step_timeout = "30s"
/// step_delay = "0ms"
/// on_dependency_failure = "run"
///
/// [executor."tool:fetch"]
/// cmd = "fetch-tool --json"
///
/// [default]
/// simulate_unresolved = false
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub engine: EngineSection,

    /// Command-backed executors keyed by `kind:id`.
    #[serde(default)]
    pub executor: BTreeMap<String, ExecutorConfig>,

    #[serde(default)]
    pub default: DefaultSection,
}

/// `[engine]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineSection {
    /// Per-step timeout such as `"30s"`. No timeout when absent.
    #[serde(default)]
    pub step_timeout: Option<String>,

    /// Delay slept before every executor call, e.g. `"200ms"`.
    #[serde(default)]
    pub step_delay: Option<String>,

    #[serde(default)]
    pub on_dependency_failure: DependencyFailurePolicy,
}


/// `[executor."<kind>:<id>"]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutorConfig {
    /// Shell command run for every step bound to this executor.
    pub cmd: String,
}

/// `[default]` section.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DefaultSection {
    /// Bind steps whose executor is not configured to the simulated executor
    /// instead of failing compilation.
    #[serde(default)]
    pub simulate_unresolved: bool,
}

/// Execution parameters handed to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub step_timeout: Option<Duration>,
    pub step_delay: Duration,
    pub on_dependency_failure: DependencyFailurePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_timeout: None,
            step_delay: Duration::ZERO,
            on_dependency_failure: DependencyFailurePolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn with_dependency_failure(mut self, policy: DependencyFailurePolicy) -> Self {
        self.on_dependency_failure = policy;
        self
    }
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (or
/// [`ConfigFile::default`]), so holders can rely on parsed durations and
/// executor references.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub engine: EngineConfig,
    pub executors: BTreeMap<ExecutorRef, ExecutorConfig>,
    pub default: DefaultSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        engine: EngineConfig,
        executors: BTreeMap<ExecutorRef, ExecutorConfig>,
        default: DefaultSection,
    ) -> Self {
        Self {
            engine,
            executors,
            default,
        }
    }
}
