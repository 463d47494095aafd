// src/exec/backend.rs

//! Executor capability abstraction.
//!
//! The engine never knows *what* a step does. It hands a [`StepRequest`] to
//! an [`Executor`] and waits for a JSON result or an error. Production
//! executors (processes, agents, humans in the loop) and test doubles all
//! implement the same trait, so they can be swapped without touching the
//! engine.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;

use crate::plan::{StepKind, StepType};
use crate::types::StepId;

/// Everything an executor needs to perform one step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub plan_id: String,
    pub step_id: StepId,
    pub step_type: StepType,
    pub description: String,
    pub depth: usize,
    /// Inputs resolved from the output store. Inputs whose producer failed
    /// (or that were never produced) are absent.
    pub inputs: BTreeMap<String, Value>,
    /// Names of the outputs the step is expected to produce.
    pub outputs: Vec<String>,
    /// Type-specific payload (query, procedure, specification, ...).
    pub spec: StepKind,
}

/// Future returned by [`Executor::execute`].
pub type ExecutorFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Value>> + Send + 'a>>;

/// A worker that performs a step and returns a structured result.
///
/// Returning `Err` marks the step as failed; the engine reports it and keeps
/// going. The engine never retries, so implementations that want retries
/// must do so themselves.
pub trait Executor: Send + Sync {
    fn execute(&self, request: StepRequest) -> ExecutorFuture<'_>;
}

/// Adapter turning an async closure into an [`Executor`].
pub struct FnExecutor<F> {
    f: F,
}

/// Build an executor from `Fn(StepRequest) -> impl Future<Output = anyhow::Result<Value>>`.
pub fn executor_fn<F, Fut>(f: F) -> FnExecutor<F>
where
    F: Fn(StepRequest) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    FnExecutor { f }
}

impl<F, Fut> Executor for FnExecutor<F>
where
    F: Fn(StepRequest) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    fn execute(&self, request: StepRequest) -> ExecutorFuture<'_> {
        Box::pin((self.f)(request))
    }
}
