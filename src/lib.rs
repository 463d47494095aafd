// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod plan;
pub mod types;

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::{CliArgs, EventFormat};
use crate::config::{load_or_default, ConfigFile};
use crate::dag::{analyze, Topology};
use crate::engine::{Compiler, PlanEvent, RunSummary};
use crate::exec::{CommandExecutor, ExecutorRegistry, SimulatedExecutor};
use crate::fs::{FileSystem, RealFileSystem};
use crate::plan::{load_plan, validate_plan, Plan};

/// High-level entry point used by `main.rs`.
///
/// Loads the plan and config, then either prints the dry-run report or
/// compiles and runs the plan, printing events as they arrive. Returns an
/// error for invalid plans, compilation failures, engine failures and runs
/// with at least one failed step.
pub async fn run(args: CliArgs) -> Result<()> {
    let plan = load_plan(&args.plan).with_context(|| format!("loading plan '{}'", args.plan))?;
    let cfg = load_or_default(&args.config)
        .with_context(|| format!("loading config '{}'", args.config))?;

    if args.dry_run {
        let report = validate_plan(&plan);
        if !report.valid {
            for issue in &report.errors {
                eprintln!("  {}: {}", issue.code, issue.message);
            }
            bail!("plan '{}' is invalid ({} issues)", plan.id, report.errors.len());
        }
        print_dry_run(&plan, &analyze(&plan));
        return Ok(());
    }

    let initial_context = match args.context.as_deref() {
        Some(path) => load_context(&RealFileSystem, path)?,
        None => Value::Null,
    };

    let registry = registry_from_config(&cfg, args.simulate);
    let engine_config = cfg.engine;
    let workflow = Compiler::new(registry).compile(plan, engine_config)?;

    let mut run = workflow.spawn(initial_context);
    while let Some(event) = run.events.recv().await {
        print_event(&event, args.events)?;
    }
    let summary = run.handle.await.context("plan run task failed")??;

    if args.events == EventFormat::Pretty {
        print_summary(&summary);
    }

    if !summary.success {
        bail!(
            "{} of {} steps failed",
            summary.steps_failed,
            summary.outcomes.len()
        );
    }
    Ok(())
}

/// Build the executor registry described by the config.
///
/// Each `[executor."kind:id"]` entry becomes a [`CommandExecutor`]. When
/// `simulate` is set (or the config asks for it) the simulated executor
/// becomes the fallback for every other reference.
pub fn registry_from_config(cfg: &ConfigFile, simulate: bool) -> ExecutorRegistry {
    let mut registry = ExecutorRegistry::new();
    for (reference, exec) in &cfg.executors {
        registry.register(reference.clone(), CommandExecutor::new(exec.cmd.clone()));
    }
    if simulate || cfg.default.simulate_unresolved {
        info!("unresolved executors fall back to the simulated executor");
        registry.set_fallback(SimulatedExecutor::new());
    }
    debug!(?registry, "executor registry ready");
    registry
}

/// Read the initial context; it must be a JSON object.
pub fn load_context(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parsing context '{}'", path.display()))?;
    if !value.is_object() {
        bail!("context '{}' must be a JSON object", path.display());
    }
    Ok(value)
}

fn print_event(event: &PlanEvent, format: EventFormat) -> Result<()> {
    match format {
        EventFormat::Json => println!("{}", serde_json::to_string(event)?),
        EventFormat::Pretty => println!("{}", format_event(event)),
    }
    Ok(())
}

/// Human-readable one-line rendering of an event.
pub fn format_event(event: &PlanEvent) -> String {
    match event {
        PlanEvent::PlanStart {
            plan_id,
            total_steps,
            critical_path_length,
            parallel_group_count,
        } => format!(
            "plan {plan_id}: {total_steps} steps, {parallel_group_count} waves, \
             critical path {critical_path_length}"
        ),
        PlanEvent::StepStart {
            step_id,
            step_type,
            description,
            depth,
        } => format!("  [{depth}] start    {step_id} ({step_type}) {description}"),
        PlanEvent::StepComplete {
            step_id,
            duration_ms,
            ..
        } => format!("      done     {step_id} in {duration_ms}ms"),
        PlanEvent::StepError {
            step_id,
            error,
            skipped: true,
            ..
        } => format!("      skipped  {step_id}: {error}"),
        PlanEvent::StepError {
            step_id,
            error,
            duration_ms,
            ..
        } => format!("      failed   {step_id} after {duration_ms}ms: {error}"),
        PlanEvent::DepthTransition {
            from_depth,
            to_depth,
            steps_completed,
            steps_failed,
        } => match to_depth {
            Some(to) => format!(
                "  wave {from_depth} -> {to} ({steps_completed} done, {steps_failed} failed)"
            ),
            None => format!(
                "  wave {from_depth} finished ({steps_completed} done, {steps_failed} failed)"
            ),
        },
        PlanEvent::Progress {
            completed_steps,
            total_steps,
        } => format!("  progress {completed_steps}/{total_steps}"),
        PlanEvent::PlanComplete {
            plan_id,
            success,
            total_duration_ms,
            ..
        } => format!(
            "plan {plan_id} {} in {total_duration_ms}ms",
            if *success { "succeeded" } else { "failed" }
        ),
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("execution order: {}", summary.execution_order.join(", "));
    println!(
        "completed: {}  failed: {}  skipped: {}",
        summary.steps_completed, summary.steps_failed, summary.steps_skipped
    );
    for (id, outcome) in &summary.outcomes {
        if let Some(ref err) = outcome.error {
            println!("  {id}: {err}");
        }
    }
}

/// Dry-run output: plan overview plus the topology report.
fn print_dry_run(plan: &Plan, topology: &Topology) {
    println!("planwave dry-run");
    println!("  plan: {}", plan.id);
    if !plan.goal_summary.is_empty() {
        println!("  goal: {}", plan.goal_summary);
    }
    println!();

    println!("steps ({}):", plan.steps.len());
    for step in &plan.steps {
        println!("  - {} [{}] -> {}", step.id, step.step_type(), step.executor);
        if !step.dependency_ids.is_empty() {
            println!("      after: {:?}", step.dependency_ids);
        }
        if !step.concurrent {
            println!("      concurrent: false");
        }
    }
    println!();

    println!("entry points: {:?}", topology.entry_points);
    println!("exit points: {:?}", topology.exit_points);
    println!("topological order: {:?}", topology.topological_order);
    println!("critical path ({}): {:?}", topology.critical_path_length(), topology.critical_path);
    println!("waves:");
    for group in &topology.parallel_groups {
        println!(
            "  depth {}: {:?} (parallelizable: {:?})",
            group.depth, group.step_ids, group.parallelizable_step_ids
        );
    }

    debug!("dry-run complete (no execution)");
}
