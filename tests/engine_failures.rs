// tests/engine_failures.rs

mod common;
use crate::common::builders::{PlanBuilder, StepBuilder};
use crate::common::{init_tracing, position_of, run_to_end};

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use planwave::config::EngineConfig;
use planwave::dag::StepState;
use planwave::engine::{Compiler, ExecutableWorkflow, PlanEvent};
use planwave::errors::PlanwaveError;
use planwave::exec::{Executor, ExecutorRegistry};
use planwave::plan::{ExecutorKind, ExecutorRef, Plan, ValidationCode};
use planwave::types::DependencyFailurePolicy;
use planwave_test_utils::{FailingExecutor, PanickingExecutor, RecordingExecutor, SlowExecutor};
use serde_json::Value;

type TestResult = Result<(), Box<dyn Error>>;

/// S1 (bound to `tool:special`) -> S2 -> S3, plus an unrelated S4.
fn chain_with_special_head() -> Plan {
    PlanBuilder::new("failing")
        .step(
            StepBuilder::research("S1")
                .executor(ExecutorKind::Tool, "special")
                .outputs(&["evidence"]),
        )
        .step(
            StepBuilder::synthesize("S2")
                .after(&["S1"])
                .inputs(&["evidence"])
                .outputs(&["summary"]),
        )
        .step(StepBuilder::develop("S3").after(&["S2"]))
        .step(StepBuilder::research("S4"))
        .build()
}

fn compile_with_special(
    plan: Plan,
    special: impl Executor + 'static,
    config: EngineConfig,
) -> (ExecutableWorkflow, RecordingExecutor) {
    let executed = Arc::new(Mutex::new(Vec::new()));
    let recorder = RecordingExecutor::new(executed);
    let mut registry = ExecutorRegistry::new();
    registry
        .register(ExecutorRef::new(ExecutorKind::Tool, "special"), special)
        .register_kind(ExecutorKind::Tool, recorder.clone());
    let workflow = Compiler::new(registry)
        .compile(plan, config)
        .expect("plan should compile");
    (workflow, recorder)
}

#[tokio::test]
async fn failed_step_does_not_stop_dependents_by_default() -> TestResult {
    init_tracing();
    let (workflow, recorder) = compile_with_special(
        chain_with_special_head(),
        FailingExecutor::new("boom"),
        EngineConfig::default(),
    );

    let (events, summary) = run_to_end(&workflow, Value::Null).await;

    assert!(!summary.success);
    assert_eq!(summary.steps_failed, 1);
    assert_eq!(summary.steps_completed, 3);
    assert_eq!(summary.steps_skipped, 0);
    assert_eq!(summary.outcomes["S1"].state, StepState::Failed);
    assert_eq!(summary.outcomes["S1"].error.as_deref(), Some("boom"));
    assert_eq!(summary.execution_order.len(), 4);

    // S2 ran without the missing input.
    let requests = recorder.requests();
    let s2 = requests.iter().find(|r| r.step_id == "S2").unwrap();
    assert!(s2.inputs.is_empty());
    assert!(!summary.outputs.contains_key("evidence"));

    match &events[position_of(&events, "step-error", "S1")] {
        PlanEvent::StepError { error, skipped, .. } => {
            assert_eq!(error, "boom");
            assert!(!skipped);
        }
        other => panic!("unexpected event {other:?}"),
    }
    match events.last() {
        Some(PlanEvent::PlanComplete {
            success,
            steps_failed,
            ..
        }) => {
            assert!(!success);
            assert_eq!(*steps_failed, 1);
        }
        other => panic!("expected plan-complete, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn skip_policy_propagates_to_transitive_dependents() -> TestResult {
    init_tracing();
    let (workflow, recorder) = compile_with_special(
        chain_with_special_head(),
        FailingExecutor::new("boom"),
        EngineConfig::default().with_dependency_failure(DependencyFailurePolicy::Skip),
    );

    let (events, summary) = run_to_end(&workflow, Value::Null).await;

    assert!(!summary.success);
    assert_eq!(summary.steps_completed, 1);
    assert_eq!(summary.steps_failed, 3);
    assert_eq!(summary.steps_skipped, 2);
    assert_eq!(summary.outcomes["S2"].state, StepState::Skipped);
    assert_eq!(summary.outcomes["S3"].state, StepState::Skipped);
    assert_eq!(recorder.executed(), vec!["S4".to_string()]);

    let skipped: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            PlanEvent::StepError {
                step_id,
                skipped: true,
                ..
            } => Some(step_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec!["S2", "S3"]);
    assert!(
        events
            .iter()
            .all(|e| !(e.kind() == "step-start" && e.step_id() == Some("S2")))
    );
    Ok(())
}

#[tokio::test]
async fn step_timeout_is_reported_as_step_error() -> TestResult {
    init_tracing();
    let (workflow, _) = compile_with_special(
        chain_with_special_head(),
        SlowExecutor::new(Duration::from_secs(10)),
        EngineConfig::default().with_step_timeout(Duration::from_millis(50)),
    );

    let (_, summary) = run_to_end(&workflow, Value::Null).await;

    let s1 = &summary.outcomes["S1"];
    assert_eq!(s1.state, StepState::Failed);
    assert_eq!(s1.error.as_deref(), Some("timed out after 50ms"));
    assert_eq!(summary.outcomes["S4"].state, StepState::Done);
    Ok(())
}

#[tokio::test]
async fn executor_panic_is_contained() -> TestResult {
    init_tracing();
    let (workflow, recorder) = compile_with_special(
        chain_with_special_head(),
        PanickingExecutor,
        EngineConfig::default(),
    );

    let (_, summary) = run_to_end(&workflow, Value::Null).await;

    assert_eq!(
        summary.outcomes["S1"].error.as_deref(),
        Some("executor panicked")
    );
    assert_eq!(summary.outcomes["S4"].state, StepState::Done);
    assert_eq!(summary.outcomes["S3"].state, StepState::Done);
    assert_eq!(recorder.executed().len(), 3);
    Ok(())
}

#[test]
fn unresolved_executor_fails_compilation() {
    let plan = PlanBuilder::new("unbound")
        .step(StepBuilder::research("S1"))
        .step(StepBuilder::research("S2").executor(ExecutorKind::Human, "reviewer"))
        .build();

    let mut registry = ExecutorRegistry::new();
    registry.register_kind(ExecutorKind::Tool, FailingExecutor::new("unused"));

    let err = Compiler::new(registry)
        .compile(plan, EngineConfig::default())
        .unwrap_err();

    match err {
        PlanwaveError::UnresolvedExecutor { step_id, executor } => {
            assert_eq!(step_id, "S2");
            assert_eq!(executor, "human:reviewer");
        }
        other => panic!("expected UnresolvedExecutor, got {other:?}"),
    }
}

#[test]
fn invalid_plan_is_refused() {
    let plan = PlanBuilder::new("broken")
        .step(StepBuilder::research("S1").after(&["S2"]))
        .step(StepBuilder::research("S2").after(&["S1"]))
        .build();

    let err = Compiler::new(ExecutorRegistry::new())
        .compile(plan, EngineConfig::default())
        .unwrap_err();

    match err {
        PlanwaveError::InvalidPlan(report) => {
            assert!(report.has_code(ValidationCode::CycleDetected));
        }
        other => panic!("expected InvalidPlan, got {other:?}"),
    }
}
