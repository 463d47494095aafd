// src/engine/compiler.rs

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::dag::{analyze, Topology};
use crate::errors::{PlanwaveError, Result};
use crate::exec::{Executor, ExecutorRegistry};
use crate::plan::{validate_plan, Plan, Step};

/// Turns plans into [`ExecutableWorkflow`]s.
///
/// The registry is supplied at construction; compiling never consults any
/// global state.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    registry: ExecutorRegistry,
}

impl Compiler {
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self { registry }
    }

    /// Validate `plan`, bind every step to an executor and precompute the
    /// topology.
    ///
    /// Fails with [`PlanwaveError::InvalidPlan`] when validation reports any
    /// issue, and with [`PlanwaveError::UnresolvedExecutor`] for the first
    /// step (in plan order) whose executor cannot be resolved. No partial
    /// workflow is produced in either case.
    pub fn compile(&self, plan: Plan, config: EngineConfig) -> Result<ExecutableWorkflow> {
        let report = validate_plan(&plan);
        if !report.valid {
            return Err(PlanwaveError::InvalidPlan(report));
        }

        let mut bindings = Vec::with_capacity(plan.steps.len());
        for (index, step) in plan.steps.iter().enumerate() {
            let executor = self.registry.resolve(&step.executor).ok_or_else(|| {
                PlanwaveError::UnresolvedExecutor {
                    step_id: step.id.clone(),
                    executor: step.executor.to_string(),
                }
            })?;
            debug!(step = %step.id, executor = %step.executor, "bound executor");
            bindings.push((index, executor));
        }

        let topology = analyze(&plan);
        let steps = bindings
            .into_iter()
            .map(|(index, executor)| CompiledStep {
                depth: topology.depth_of(&plan.steps[index].id).unwrap_or(0),
                index,
                executor,
            })
            .collect();

        info!(
            plan = %plan.id,
            steps = plan.steps.len(),
            waves = topology.parallel_groups.len(),
            critical_path = topology.critical_path_length(),
            "plan compiled"
        );

        Ok(ExecutableWorkflow {
            inner: Arc::new(WorkflowInner {
                plan,
                topology,
                steps,
                config,
            }),
        })
    }
}

/// A step bound to its executor.
#[derive(Clone)]
pub struct CompiledStep {
    /// Position of the step in `plan.steps`.
    index: usize,
    depth: usize,
    executor: Arc<dyn Executor>,
}

impl CompiledStep {
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn executor(&self) -> Arc<dyn Executor> {
        Arc::clone(&self.executor)
    }
}

impl fmt::Debug for CompiledStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledStep")
            .field("index", &self.index)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct WorkflowInner {
    plan: Plan,
    topology: Topology,
    steps: Vec<CompiledStep>,
    config: EngineConfig,
}

/// A validated plan with every step bound to an executor.
///
/// Cheap to clone; clones share the compiled data. Each call to
/// [`ExecutableWorkflow::run`] or [`ExecutableWorkflow::spawn`] starts an
/// independent run with fresh state.
#[derive(Debug, Clone)]
pub struct ExecutableWorkflow {
    inner: Arc<WorkflowInner>,
}

impl ExecutableWorkflow {
    pub fn plan(&self) -> &Plan {
        &self.inner.plan
    }

    pub fn topology(&self) -> &Topology {
        &self.inner.topology
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Steps in plan order, each with its bound executor.
    pub fn steps(&self) -> impl Iterator<Item = (&Step, &CompiledStep)> {
        self.inner
            .steps
            .iter()
            .map(|c| (&self.inner.plan.steps[c.index], c))
    }

    pub fn compiled_step(&self, id: &str) -> Option<(&Step, &CompiledStep)> {
        self.steps().find(|(step, _)| step.id == id)
    }
}
