// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::step_info::{StepCompletion, StepInfo, StepState};
use crate::dag::topology::Topology;
use crate::errors::{PlanwaveError, Result};
use crate::plan::Plan;
use crate::types::{DependencyFailurePolicy, StepId};

/// A step held back from dispatch because a dependency did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStep {
    pub id: StepId,
    pub failed_dependency: StepId,
}

/// One wave handed to the engine.
#[derive(Debug, Clone)]
pub struct Wave {
    pub depth: usize,
    /// Steps marked `Running`; the engine must dispatch all of them.
    pub dispatch: Vec<StepId>,
    /// Steps marked `Skipped` (only under [`DependencyFailurePolicy::Skip`]).
    pub skipped: Vec<SkippedStep>,
    /// Depth of the following wave, if any.
    pub next_depth: Option<usize>,
}

/// Per-run state machine for wave-by-wave execution.
///
/// This is the synchronous core of a run: it owns step states, hands out
/// waves in ascending depth and records completions. It performs no IO, so
/// every ordering rule can be tested without Tokio.
///
/// Wave `N + 1` is only handed out once every step of wave `N` is terminal.
/// Any breach of that rule is reported as [`PlanwaveError::Engine`].
#[derive(Debug)]
pub struct Scheduler {
    steps: HashMap<StepId, StepInfo>,
    waves: Vec<Vec<StepId>>,
    next_wave: usize,
    policy: DependencyFailurePolicy,
}

impl Scheduler {
    /// Build a fresh run state from a validated plan and its topology.
    pub fn new(plan: &Plan, topology: &Topology, policy: DependencyFailurePolicy) -> Self {
        let mut steps = HashMap::with_capacity(plan.steps.len());
        for step in &plan.steps {
            let depth = topology.depth_of(&step.id).unwrap_or(0);
            steps.insert(
                step.id.clone(),
                StepInfo {
                    id: step.id.clone(),
                    step_type: step.step_type(),
                    depth,
                    deps: step.dependency_ids.clone(),
                    state: StepState::Pending,
                },
            );
        }

        let waves = topology
            .parallel_groups
            .iter()
            .map(|g| g.step_ids.clone())
            .collect();

        Self {
            steps,
            waves,
            next_wave: 0,
            policy,
        }
    }

    pub fn wave_count(&self) -> usize {
        self.waves.len()
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn state_of(&self, id: &str) -> Option<StepState> {
        self.steps.get(id).map(|s| s.state)
    }

    /// Number of steps currently in `state`.
    pub fn count(&self, state: StepState) -> usize {
        self.steps.values().filter(|s| s.state == state).count()
    }

    pub fn terminal_count(&self) -> usize {
        self.steps.values().filter(|s| s.state.is_terminal()).count()
    }

    pub fn all_terminal(&self) -> bool {
        self.steps.values().all(|s| s.state.is_terminal())
    }

    /// Direct dependencies of `id` that ended failed or skipped, ascending.
    pub fn unsuccessful_dependencies(&self, id: &str) -> Vec<StepId> {
        let Some(info) = self.steps.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<StepId> = info
            .deps
            .iter()
            .filter(|d| {
                self.steps
                    .get(d.as_str())
                    .is_some_and(|dep| dep.state.is_unsuccessful())
            })
            .cloned()
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Hand out the next wave, or `None` once every wave has been issued.
    pub fn next_wave(&mut self) -> Result<Option<Wave>> {
        if self.next_wave >= self.waves.len() {
            return Ok(None);
        }

        if self.next_wave > 0 {
            let previous = &self.waves[self.next_wave - 1];
            if let Some(open) = previous
                .iter()
                .find(|id| self.state_of(id).is_some_and(|s| !s.is_terminal()))
            {
                return Err(PlanwaveError::Engine(format!(
                    "wave {} requested while step '{}' of wave {} is still running",
                    self.next_wave,
                    open,
                    self.next_wave - 1
                )));
            }
        }

        let depth = self.next_wave;
        let members = self.waves[depth].clone();
        let mut dispatch = Vec::with_capacity(members.len());
        let mut skipped = Vec::new();

        for id in members {
            self.ensure_dependencies_terminal(&id)?;

            let failed = self.unsuccessful_dependencies(&id);
            let info = self.steps.get_mut(&id).ok_or_else(|| {
                PlanwaveError::Engine(format!("wave {depth} lists unknown step '{id}'"))
            })?;

            if info.state != StepState::Pending {
                return Err(PlanwaveError::Engine(format!(
                    "step '{}' scheduled twice (state {:?})",
                    id, info.state
                )));
            }

            match (self.policy, failed.first()) {
                (DependencyFailurePolicy::Skip, Some(failed_dep)) => {
                    warn!(
                        step = %id,
                        dep = %failed_dep,
                        "dependency did not succeed; skipping step"
                    );
                    info.state = StepState::Skipped;
                    skipped.push(SkippedStep {
                        id,
                        failed_dependency: failed_dep.clone(),
                    });
                }
                (_, failed_dep) => {
                    if let Some(dep) = failed_dep {
                        debug!(
                            step = %id,
                            dep = %dep,
                            "dependency failed; running step with partial inputs"
                        );
                    }
                    info.state = StepState::Running;
                    dispatch.push(id);
                }
            }
        }

        self.next_wave += 1;
        let next_depth = (self.next_wave < self.waves.len()).then_some(self.next_wave);

        info!(
            depth,
            dispatch = dispatch.len(),
            skipped = skipped.len(),
            "scheduler: wave ready"
        );

        Ok(Some(Wave {
            depth,
            dispatch,
            skipped,
            next_depth,
        }))
    }

    /// Record the outcome of a dispatched step.
    pub fn record_completion(&mut self, id: &str, completion: StepCompletion) -> Result<()> {
        let info = self
            .steps
            .get_mut(id)
            .ok_or_else(|| PlanwaveError::Engine(format!("completion for unknown step '{id}'")))?;

        if info.state != StepState::Running {
            return Err(PlanwaveError::Engine(format!(
                "completion for step '{}' which is not running (state {:?})",
                id, info.state
            )));
        }

        info.state = match completion {
            StepCompletion::Success => StepState::Done,
            StepCompletion::Failed => StepState::Failed,
        };
        debug!(step = %id, state = ?info.state, "scheduler: step terminal");
        Ok(())
    }

    fn ensure_dependencies_terminal(&self, id: &str) -> Result<()> {
        let info = self
            .steps
            .get(id)
            .ok_or_else(|| PlanwaveError::Engine(format!("unknown step '{id}'")))?;

        for dep in &info.deps {
            match self.steps.get(dep.as_str()).map(|d| d.state) {
                Some(state) if state.is_terminal() => {}
                Some(state) => {
                    return Err(PlanwaveError::Engine(format!(
                        "step '{}' reached its wave before dependency '{}' finished (state {:?})",
                        id, dep, state
                    )));
                }
                None => {
                    return Err(PlanwaveError::Engine(format!(
                        "step '{}' depends on unknown step '{}'",
                        id, dep
                    )));
                }
            }
        }
        Ok(())
    }
}
