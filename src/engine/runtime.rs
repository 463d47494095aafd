// src/engine/runtime.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dag::{Scheduler, SkippedStep, StepCompletion, StepState, Wave};
use crate::engine::compiler::ExecutableWorkflow;
use crate::engine::events::{EventSink, PlanEvent};
use crate::engine::store::OutputStore;
use crate::errors::{PlanwaveError, Result};
use crate::exec::{Executor, StepRequest};
use crate::plan::StepType;
use crate::types::StepId;

/// Final state of one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub state: StepState,
    pub step_type: StepType,
    pub depth: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Value returned by the executor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// What a finished run hands back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub plan_id: String,
    /// `true` iff no step failed or was skipped.
    pub success: bool,
    pub total_duration_ms: u64,
    pub steps_completed: usize,
    /// Failed steps, skipped steps included.
    pub steps_failed: usize,
    pub steps_skipped: usize,
    /// Step ids in the order they reached a terminal state.
    pub execution_order: Vec<StepId>,
    pub outcomes: BTreeMap<StepId, StepOutcome>,
    /// Contents of the output store at the end of the run.
    pub outputs: BTreeMap<String, Value>,
}

/// A run started with [`ExecutableWorkflow::spawn`].
#[derive(Debug)]
pub struct PlanRun {
    pub events: mpsc::UnboundedReceiver<PlanEvent>,
    pub handle: JoinHandle<Result<RunSummary>>,
}

impl PlanRun {
    /// Drain every remaining event, then wait for the summary.
    pub async fn collect(mut self) -> Result<(Vec<PlanEvent>, RunSummary)> {
        let mut events = Vec::new();
        while let Some(ev) = self.events.recv().await {
            events.push(ev);
        }
        let summary = self
            .handle
            .await
            .map_err(|e| PlanwaveError::Engine(format!("run task failed: {e}")))??;
        Ok((events, summary))
    }
}

impl ExecutableWorkflow {
    /// Start a run on the current Tokio runtime.
    ///
    /// Events queue up until read, so `handle` may be awaited before
    /// `events` is drained. Dropping the receiver does not stop the run.
    pub fn spawn(&self, initial_context: Value) -> PlanRun {
        let (tx, rx) = mpsc::unbounded_channel();
        let workflow = self.clone();
        let handle = tokio::spawn(async move { workflow.run(initial_context, tx).await });
        PlanRun { events: rx, handle }
    }

    /// Execute the workflow wave by wave, sending events to `events`.
    ///
    /// Step failures are reported through events and the summary. `Err` is
    /// only returned for engine-fatal conditions.
    pub async fn run(
        &self,
        initial_context: Value,
        events: mpsc::UnboundedSender<PlanEvent>,
    ) -> Result<RunSummary> {
        Runtime::new(self.clone(), EventSink::new(events), initial_context)
            .run()
            .await
    }
}

/// Result of one dispatched step, produced by its task.
#[derive(Debug)]
struct FinishedStep {
    step_id: StepId,
    step_type: StepType,
    duration_ms: u64,
    result: std::result::Result<Value, String>,
}

/// Async shell around [`Scheduler`] for a single run.
///
/// The scheduler decides which steps may run; this type performs the IO:
/// spawning executor calls, joining them at the wave barrier, committing
/// outputs and emitting events.
struct Runtime {
    workflow: ExecutableWorkflow,
    sink: EventSink,
    scheduler: Scheduler,
    store: OutputStore,
    outcomes: BTreeMap<StepId, StepOutcome>,
    execution_order: Vec<StepId>,
}

impl Runtime {
    fn new(workflow: ExecutableWorkflow, sink: EventSink, initial_context: Value) -> Self {
        let scheduler = Scheduler::new(
            workflow.plan(),
            workflow.topology(),
            workflow.config().on_dependency_failure,
        );
        Self {
            workflow,
            sink,
            scheduler,
            store: OutputStore::seeded(initial_context),
            outcomes: BTreeMap::new(),
            execution_order: Vec::new(),
        }
    }

    async fn run(mut self) -> Result<RunSummary> {
        let started = Instant::now();
        let plan_id = self.workflow.plan().id.clone();
        let topology = self.workflow.topology();
        let total_steps = self.scheduler.total_steps();

        info!(
            plan = %plan_id,
            steps = total_steps,
            waves = topology.parallel_groups.len(),
            "plan run started"
        );
        self.sink.emit(PlanEvent::PlanStart {
            plan_id: plan_id.clone(),
            total_steps,
            critical_path_length: topology.critical_path_length(),
            parallel_group_count: topology.parallel_groups.len(),
        });

        while let Some(wave) = self.scheduler.next_wave()? {
            self.run_wave(&wave).await?;

            let (completed, failed, _) = self.counts();
            self.sink.emit(PlanEvent::DepthTransition {
                from_depth: wave.depth,
                to_depth: wave.next_depth,
                steps_completed: completed,
                steps_failed: failed,
            });
            self.sink.emit(PlanEvent::Progress {
                completed_steps: self.scheduler.terminal_count(),
                total_steps,
            });
        }

        if !self.scheduler.all_terminal() {
            return Err(PlanwaveError::Engine(format!(
                "run ended with {} of {} steps unfinished",
                total_steps - self.scheduler.terminal_count(),
                total_steps
            )));
        }

        let (steps_completed, steps_failed, steps_skipped) = self.counts();
        let success = steps_failed == 0;
        let total_duration_ms = millis(started.elapsed());

        info!(
            plan = %plan_id,
            success,
            completed = steps_completed,
            failed = steps_failed,
            skipped = steps_skipped,
            duration_ms = total_duration_ms,
            "plan run finished"
        );
        self.sink.emit(PlanEvent::PlanComplete {
            plan_id: plan_id.clone(),
            success,
            total_duration_ms,
            steps_completed,
            steps_failed,
            steps_skipped,
        });

        Ok(RunSummary {
            plan_id,
            success,
            total_duration_ms,
            steps_completed,
            steps_failed,
            steps_skipped,
            execution_order: self.execution_order,
            outcomes: self.outcomes,
            outputs: self.store.into_values(),
        })
    }

    async fn run_wave(&mut self, wave: &Wave) -> Result<()> {
        info!(
            depth = wave.depth,
            steps = wave.dispatch.len(),
            skipped = wave.skipped.len(),
            "wave starting"
        );

        for skipped in &wave.skipped {
            self.record_skipped(wave.depth, skipped)?;
        }

        // Inputs are resolved here, before any step of the wave starts, and
        // outputs are committed only after the join below.
        let config = *self.workflow.config();
        let mut tasks = JoinSet::new();
        for id in &wave.dispatch {
            let (request, executor) = self.prepare(id)?;
            debug!(step = %id, inputs = request.inputs.len(), "dispatching step");
            tasks.spawn(run_step(request, executor, self.sink.clone(), config));
        }

        while let Some(joined) = tasks.join_next().await {
            let finished =
                joined.map_err(|e| PlanwaveError::Engine(format!("step task failed: {e}")))?;
            self.record_finished(wave.depth, finished)?;
        }
        Ok(())
    }

    fn prepare(&self, id: &str) -> Result<(StepRequest, Arc<dyn Executor>)> {
        let (step, compiled) = self
            .workflow
            .compiled_step(id)
            .ok_or_else(|| PlanwaveError::Engine(format!("no compiled step for '{id}'")))?;

        let request = StepRequest {
            plan_id: self.workflow.plan().id.clone(),
            step_id: step.id.clone(),
            step_type: step.step_type(),
            description: step.description.clone(),
            depth: compiled.depth(),
            inputs: self.store.resolve_inputs(&step.inputs),
            outputs: step.outputs.iter().map(|o| o.name.clone()).collect(),
            spec: step.kind.clone(),
        };
        Ok((request, compiled.executor()))
    }

    fn record_skipped(&mut self, depth: usize, skipped: &SkippedStep) -> Result<()> {
        let step = self.workflow.plan().step(&skipped.id).ok_or_else(|| {
            PlanwaveError::Engine(format!("unknown skipped step '{}'", skipped.id))
        })?;
        let step_type = step.step_type();
        let error = format!(
            "skipped: dependency '{}' did not succeed",
            skipped.failed_dependency
        );

        self.sink.emit(PlanEvent::StepError {
            step_id: skipped.id.clone(),
            step_type,
            error: error.clone(),
            duration_ms: 0,
            skipped: true,
        });

        self.execution_order.push(skipped.id.clone());
        self.outcomes.insert(
            skipped.id.clone(),
            StepOutcome {
                state: StepState::Skipped,
                step_type,
                depth,
                duration_ms: 0,
                error: Some(error),
                result: None,
            },
        );
        Ok(())
    }

    fn record_finished(&mut self, depth: usize, finished: FinishedStep) -> Result<()> {
        let FinishedStep {
            step_id,
            step_type,
            duration_ms,
            result,
        } = finished;

        let completion = match result {
            Ok(_) => StepCompletion::Success,
            Err(_) => StepCompletion::Failed,
        };
        self.scheduler.record_completion(&step_id, completion)?;

        let (error, result) = match result {
            Ok(value) => {
                let step = self.workflow.plan().step(&step_id).ok_or_else(|| {
                    PlanwaveError::Engine(format!("completion for unknown step '{step_id}'"))
                })?;
                self.store.commit(&step_id, &step.outputs, &value);
                (None, Some(value))
            }
            Err(message) => (Some(message), None),
        };

        self.execution_order.push(step_id.clone());
        self.outcomes.insert(
            step_id,
            StepOutcome {
                state: match completion {
                    StepCompletion::Success => StepState::Done,
                    StepCompletion::Failed => StepState::Failed,
                },
                step_type,
                depth,
                duration_ms,
                error,
                result,
            },
        );
        Ok(())
    }

    /// `(completed, failed including skipped, skipped)`.
    fn counts(&self) -> (usize, usize, usize) {
        let skipped = self.scheduler.count(StepState::Skipped);
        (
            self.scheduler.count(StepState::Done),
            self.scheduler.count(StepState::Failed) + skipped,
            skipped,
        )
    }
}

/// Body of one step task: events around a guarded executor call.
async fn run_step(
    request: StepRequest,
    executor: Arc<dyn Executor>,
    sink: EventSink,
    config: EngineConfig,
) -> FinishedStep {
    let step_id = request.step_id.clone();
    let step_type = request.step_type;

    sink.emit(PlanEvent::StepStart {
        step_id: step_id.clone(),
        step_type,
        description: request.description.clone(),
        depth: request.depth,
    });

    let started = Instant::now();
    if !config.step_delay.is_zero() {
        tokio::time::sleep(config.step_delay).await;
    }
    let result = invoke(executor, request, config.step_timeout).await;
    let duration_ms = millis(started.elapsed());

    match &result {
        Ok(_) => {
            debug!(step = %step_id, duration_ms, "step complete");
            sink.emit(PlanEvent::StepComplete {
                step_id: step_id.clone(),
                step_type,
                duration_ms,
            });
        }
        Err(message) => {
            warn!(step = %step_id, error = %message, duration_ms, "step failed");
            sink.emit(PlanEvent::StepError {
                step_id: step_id.clone(),
                step_type,
                error: message.clone(),
                duration_ms,
                skipped: false,
            });
        }
    }

    FinishedStep {
        step_id,
        step_type,
        duration_ms,
        result,
    }
}

/// Call the executor on its own task so a panic stays contained, bounded by
/// the optional timeout.
async fn invoke(
    executor: Arc<dyn Executor>,
    request: StepRequest,
    timeout: Option<Duration>,
) -> std::result::Result<Value, String> {
    let mut handle = tokio::spawn(async move { executor.execute(request).await });

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return Err(format!("timed out after {}ms", limit.as_millis()));
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(format!("{err:#}")),
        Err(e) if e.is_panic() => Err("executor panicked".to_string()),
        Err(e) => Err(format!("executor task ended unexpectedly: {e}")),
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
