// tests/documents.rs

mod common;
use crate::common::{init_tracing, run_to_end};

use std::error::Error;
use std::io::Write;
use std::time::Duration;

use tempfile::{Builder, NamedTempFile};

use planwave::config::{load_and_validate, load_or_default, EngineConfig};
use planwave::engine::Compiler;
use planwave::errors::PlanwaveError;
use planwave::plan::{load_plan, validate_plan, StepType};
use planwave::registry_from_config;
use planwave::types::DependencyFailurePolicy;
use serde_json::{json, Value};

type TestResult = Result<(), Box<dyn Error>>;

const JSON_PLAN: &str = r#"{
    "id": "survey",
    "goalSummary": "Survey wave schedulers",
    "requirements": [{ "id": "R1", "description": "cover prior art", "priority": "must" }],
    "hypotheses": [{ "id": "H1", "statement": "waves are enough", "status": "testing" }],
    "steps": [
        {
            "type": "research",
            "id": "S1",
            "description": "collect papers",
            "requirementIds": ["R1"],
            "query": "DAG schedulers",
            "outputs": [{ "name": "papers" }],
            "executor": { "kind": "tool", "id": "search" }
        },
        {
            "type": "synthesize",
            "id": "S2",
            "dependencyIds": ["S1"],
            "hypothesisIds": ["H1"],
            "mode": "integrate",
            "inputs": [{ "name": "papers" }],
            "outputs": [{ "name": "review" }],
            "executor": { "kind": "agent", "id": "writer" }
        }
    ],
    "unknownsMap": { "known_unknowns": ["scale"] }
}"#;

fn json_plan_file() -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = Builder::new().suffix(".json").tempfile()?;
    write!(file, "{JSON_PLAN}")?;
    Ok(file)
}

#[test]
fn loads_json_plan_document() -> TestResult {
    let file = json_plan_file()?;
    let plan = load_plan(file.path())?;

    assert_eq!(plan.id, "survey");
    assert_eq!(plan.steps.len(), 2);
    assert_eq!(plan.steps[1].step_type(), StepType::Synthesize);
    assert_eq!(plan.unknowns_map["known_unknowns"][0], "scale");
    assert!(validate_plan(&plan).valid);
    Ok(())
}

#[test]
fn loads_toml_plan_document() -> TestResult {
    let mut file = Builder::new().suffix(".toml").tempfile()?;
    write!(
        file,
        r#"
id = "build"

[[steps]]
type = "develop"
id = "S1"
specification = "write the parser"
executor = {{ kind = "workflow", id = "ci" }}

[[steps]]
type = "experiment"
id = "S2"
dependencyIds = ["S1"]
mode = "exploratory"
procedure = "fuzz it"
concurrent = false
executor = {{ kind = "tool", id = "fuzzer" }}
"#
    )?;

    let plan = load_plan(file.path())?;
    assert_eq!(plan.steps[0].executor.to_string(), "workflow:ci");
    assert!(!plan.steps[1].concurrent);
    assert!(validate_plan(&plan).valid);
    Ok(())
}

#[test]
fn malformed_plan_reports_parse_error() -> TestResult {
    let mut file = Builder::new().suffix(".json").tempfile()?;
    write!(file, "{{ \"id\": ")?;

    match load_plan(file.path()) {
        Err(PlanwaveError::JsonError(_)) => Ok(()),
        other => panic!("expected JsonError, got {other:?}"),
    }
}

#[test]
fn config_file_from_disk() -> TestResult {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
[engine]
step_timeout = "1s"
on_dependency_failure = "skip"

[executor."tool:search"]
cmd = "cat"
"#
    )?;

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.engine.step_timeout, Some(Duration::from_secs(1)));
    assert_eq!(
        cfg.engine.on_dependency_failure,
        DependencyFailurePolicy::Skip
    );
    assert_eq!(cfg.executors.len(), 1);
    Ok(())
}

#[test]
fn missing_config_falls_back_to_defaults() -> TestResult {
    let dir = tempfile::tempdir()?;
    let cfg = load_or_default(dir.path().join("Planwave.toml"))?;
    assert!(cfg.executors.is_empty());
    assert_eq!(cfg.engine, EngineConfig::default());
    Ok(())
}

#[test]
fn invalid_config_is_rejected() -> TestResult {
    let mut file = NamedTempFile::new()?;
    write!(file, "[engine]\nstep_timeout = \"0s\"\n")?;

    match load_and_validate(file.path()) {
        Err(PlanwaveError::ConfigError(msg)) => {
            assert!(msg.contains("step_timeout"));
            Ok(())
        }
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[tokio::test]
async fn simulated_run_of_loaded_plan() -> TestResult {
    init_tracing();
    let file = json_plan_file()?;
    let plan = load_plan(file.path())?;

    let mut cfg_file = NamedTempFile::new()?;
    write!(cfg_file, "[default]\nsimulate_unresolved = true\n")?;
    let cfg = load_and_validate(cfg_file.path())?;

    let workflow = Compiler::new(registry_from_config(&cfg, false)).compile(plan, cfg.engine)?;
    let (_, summary) = run_to_end(&workflow, Value::Null).await;

    assert!(summary.success);
    assert_eq!(summary.outputs["papers"], json!("S1:papers"));
    assert_eq!(summary.outputs["review"], json!("S2:review"));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn command_executor_round_trip() -> TestResult {
    init_tracing();
    let file = json_plan_file()?;
    let plan = load_plan(file.path())?;

    // S1 echoes a JSON object; S2 fails with a message on stderr.
    let mut cfg_file = NamedTempFile::new()?;
    write!(
        cfg_file,
        r#"
[executor."tool:search"]
cmd = "cat > /dev/null; echo '{{\"papers\": [\"a\", \"b\"]}}'"

[executor."agent:writer"]
cmd = "echo 'writer offline' >&2; exit 3"
"#
    )?;
    let cfg = load_and_validate(cfg_file.path())?;

    let workflow = Compiler::new(registry_from_config(&cfg, false)).compile(plan, cfg.engine)?;
    let (_, summary) = run_to_end(&workflow, Value::Null).await;

    assert_eq!(summary.outputs["papers"], json!(["a", "b"]));
    let s2 = &summary.outcomes["S2"];
    let error = s2.error.as_deref().unwrap_or_default();
    assert!(error.contains("status 3"), "got {error}");
    assert!(error.contains("writer offline"), "got {error}");
    assert!(!summary.success);
    Ok(())
}
