// src/exec/simulated.rs

use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use crate::exec::backend::{Executor, ExecutorFuture, StepRequest};

/// Executor that pretends to run a step.
///
/// For every declared output `name` it produces `"<stepId>:<name>"`, so a
/// plan can be walked end to end (and its data flow inspected) without any
/// real executor configured. Used by `--simulate` and as the fallback for
/// unresolved references when `[default] simulate_unresolved = true`.
#[derive(Debug, Clone, Default)]
pub struct SimulatedExecutor {
    delay: Duration,
}

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    fn result_for(request: &StepRequest) -> Value {
        let outputs: Map<String, Value> = request
            .outputs
            .iter()
            .map(|name| (name.clone(), Value::String(format!("{}:{}", request.step_id, name))))
            .collect();
        Value::Object(outputs)
    }
}

impl Executor for SimulatedExecutor {
    fn execute(&self, request: StepRequest) -> ExecutorFuture<'_> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            debug!(
                step = %request.step_id,
                inputs = request.inputs.len(),
                "simulated step"
            );
            Ok(Self::result_for(&request))
        })
    }
}
