#![allow(dead_code)]

pub use planwave_test_utils::builders;
pub use planwave_test_utils::init_tracing;

use std::sync::{Arc, Mutex};

use planwave::config::EngineConfig;
use planwave::engine::{Compiler, ExecutableWorkflow, PlanEvent, RunSummary};
use planwave::exec::{Executor, ExecutorRegistry};
use planwave::plan::{ExecutorKind, Plan};
use planwave_test_utils::RecordingExecutor;
use serde_json::Value;
use tokio::time::{timeout, Duration};

use crate::common::builders::{PlanBuilder, StepBuilder};

/// Registry whose `tool` kind default is `executor`.
pub fn registry_with(executor: impl Executor + 'static) -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();
    registry.register_kind(ExecutorKind::Tool, executor);
    registry
}

/// Compile `plan` against a recording executor bound to every `tool` step.
pub fn compile_recording(
    plan: Plan,
    config: EngineConfig,
) -> (ExecutableWorkflow, RecordingExecutor, Arc<Mutex<Vec<String>>>) {
    let executed = Arc::new(Mutex::new(Vec::new()));
    let recorder = RecordingExecutor::new(Arc::clone(&executed));
    let workflow = Compiler::new(registry_with(recorder.clone()))
        .compile(plan, config)
        .expect("plan should compile");
    (workflow, recorder, executed)
}

/// Spawn a run and collect all events plus the summary, bounded by 5s.
pub async fn run_to_end(
    workflow: &ExecutableWorkflow,
    context: Value,
) -> (Vec<PlanEvent>, RunSummary) {
    let run = workflow.spawn(context);
    timeout(Duration::from_secs(5), run.collect())
        .await
        .expect("run timed out")
        .expect("run failed")
}

pub fn event_kinds(events: &[PlanEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.kind()).collect()
}

/// Index of the first event of `kind` about `step`.
pub fn position_of(events: &[PlanEvent], kind: &str, step: &str) -> usize {
    events
        .iter()
        .position(|e| e.kind() == kind && e.step_id() == Some(step))
        .unwrap_or_else(|| panic!("no {kind} event for {step}"))
}

pub fn single_step_plan() -> Plan {
    PlanBuilder::new("minimal")
        .step(StepBuilder::research("S1"))
        .build()
}

pub fn linear_plan() -> Plan {
    PlanBuilder::new("linear")
        .step(StepBuilder::research("S1").outputs(&["notes"]))
        .step(
            StepBuilder::synthesize("S2")
                .after(&["S1"])
                .inputs(&["notes"])
                .outputs(&["draft"]),
        )
        .step(StepBuilder::develop("S3").after(&["S2"]).inputs(&["draft"]))
        .build()
}

pub fn fan_in_plan() -> Plan {
    PlanBuilder::new("fan-in")
        .step(StepBuilder::research("S1"))
        .step(StepBuilder::research("S2"))
        .step(StepBuilder::research("S3"))
        .step(StepBuilder::synthesize("S4").after(&["S1", "S2", "S3"]))
        .build()
}

pub fn diamond_plan() -> Plan {
    PlanBuilder::new("diamond")
        .step(StepBuilder::research("S1"))
        .step(StepBuilder::research("S2").after(&["S1"]))
        .step(StepBuilder::research("S3").after(&["S1"]))
        .step(StepBuilder::synthesize("S4").after(&["S2", "S3"]))
        .build()
}
