use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use serde_json::{json, Map, Value};

use planwave::exec::{Executor, ExecutorFuture, StepRequest};

/// A fake executor that:
/// - records which steps were run (and with which inputs)
/// - answers every declared output with `"<stepId>:<output>"`.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<StepRequest>>>,
    delay: Option<Duration>,
}

impl RecordingExecutor {
    pub fn new(executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            executed,
            ..Self::default()
        }
    }

    /// Sleep before answering, so siblings in a wave overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<StepRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Executor for RecordingExecutor {
    fn execute(&self, request: StepRequest) -> ExecutorFuture<'_> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(request.step_id.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let outputs: Map<String, Value> = request
                .outputs
                .iter()
                .map(|o| (o.clone(), json!(format!("{}:{}", request.step_id, o))))
                .collect();
            self.requests.lock().unwrap().push(request);
            Ok(Value::Object(outputs))
        })
    }
}

/// Always fails with the given message.
#[derive(Clone)]
pub struct FailingExecutor {
    message: String,
}

impl FailingExecutor {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl Executor for FailingExecutor {
    fn execute(&self, _request: StepRequest) -> ExecutorFuture<'_> {
        Box::pin(async move { Err(anyhow!("{}", self.message)) })
    }
}

/// Sleeps for a fixed time, then succeeds with `null`.
#[derive(Clone)]
pub struct SlowExecutor {
    delay: Duration,
}

impl SlowExecutor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Executor for SlowExecutor {
    fn execute(&self, _request: StepRequest) -> ExecutorFuture<'_> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            Ok(Value::Null)
        })
    }
}

/// Panics inside `execute`'s future.
#[derive(Clone, Default)]
pub struct PanickingExecutor;

impl Executor for PanickingExecutor {
    fn execute(&self, request: StepRequest) -> ExecutorFuture<'_> {
        Box::pin(async move { blow_up(&request.step_id) })
    }
}

fn blow_up(step_id: &str) -> anyhow::Result<Value> {
    panic!("executor for {step_id} blew up")
}
