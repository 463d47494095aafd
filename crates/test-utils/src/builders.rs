#![allow(dead_code)]

use std::collections::BTreeMap;

use planwave::config::{ConfigFile, DefaultSection, EngineSection, ExecutorConfig, RawConfigFile};
use planwave::plan::{
    DataSlot, DevelopSpec, ExecutorKind, ExecutorRef, ExperimentMode, ExperimentSpec, Hypothesis,
    HypothesisStatus, Plan, Priority, Requirement, ResearchSpec, Step, StepKind, SynthesisMode,
    SynthesizeSpec,
};
use planwave::types::DependencyFailurePolicy;

/// Builder for `Plan` to simplify test setup.
pub struct PlanBuilder {
    plan: Plan,
}

impl PlanBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            plan: Plan {
                id: id.to_string(),
                goal_summary: String::new(),
                requirements: Vec::new(),
                hypotheses: Vec::new(),
                steps: Vec::new(),
                unknowns_map: serde_json::Value::Null,
            },
        }
    }

    pub fn goal(mut self, summary: &str) -> Self {
        self.plan.goal_summary = summary.to_string();
        self
    }

    pub fn requirement(mut self, id: &str, priority: Priority) -> Self {
        self.plan.requirements.push(Requirement {
            id: id.to_string(),
            description: format!("requirement {id}"),
            priority,
        });
        self
    }

    pub fn hypothesis(mut self, id: &str) -> Self {
        self.plan.hypotheses.push(Hypothesis {
            id: id.to_string(),
            statement: format!("hypothesis {id}"),
            assumptions: Vec::new(),
            status: HypothesisStatus::Untested,
        });
        self
    }

    pub fn step(mut self, step: StepBuilder) -> Self {
        self.plan.steps.push(step.build());
        self
    }

    pub fn build(self) -> Plan {
        self.plan
    }
}

/// Builder for `Step`. Defaults to a research step bound to `tool:test`.
pub struct StepBuilder {
    step: Step,
}

impl StepBuilder {
    pub fn research(id: &str) -> Self {
        Self::with_kind(
            id,
            StepKind::Research(ResearchSpec {
                query: format!("what does {id} find?"),
                stopping_rule: String::new(),
            }),
        )
    }

    pub fn synthesize(id: &str) -> Self {
        Self::with_kind(
            id,
            StepKind::Synthesize(SynthesizeSpec {
                mode: Some(SynthesisMode::Integrate),
                evaluate_against: Vec::new(),
            }),
        )
    }

    pub fn experiment(id: &str, mode: ExperimentMode) -> Self {
        Self::with_kind(
            id,
            StepKind::Experiment(ExperimentSpec {
                mode: Some(mode),
                procedure: format!("procedure for {id}"),
                preregistered_commitments: match mode {
                    ExperimentMode::Confirmatory => vec!["primary metric fixed".to_string()],
                    ExperimentMode::Exploratory => Vec::new(),
                },
                ..ExperimentSpec::default()
            }),
        )
    }

    pub fn develop(id: &str) -> Self {
        Self::with_kind(
            id,
            StepKind::Develop(DevelopSpec {
                specification: format!("build {id}"),
                deliverables: Vec::new(),
            }),
        )
    }

    pub fn with_kind(id: &str, kind: StepKind) -> Self {
        Self {
            step: Step {
                id: id.to_string(),
                description: format!("step {id}"),
                dependency_ids: Vec::new(),
                requirement_ids: Vec::new(),
                hypothesis_ids: Vec::new(),
                inputs: Vec::new(),
                outputs: Vec::new(),
                executor: ExecutorRef::new(ExecutorKind::Tool, "test"),
                concurrent: true,
                kind,
            },
        }
    }

    pub fn after(mut self, deps: &[&str]) -> Self {
        self.step
            .dependency_ids
            .extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn inputs(mut self, names: &[&str]) -> Self {
        self.step.inputs.extend(names.iter().map(|n| DataSlot::named(*n)));
        self
    }

    pub fn outputs(mut self, names: &[&str]) -> Self {
        self.step.outputs.extend(names.iter().map(|n| DataSlot::named(*n)));
        self
    }

    pub fn executor(mut self, kind: ExecutorKind, id: &str) -> Self {
        self.step.executor = ExecutorRef::new(kind, id);
        self
    }

    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.step.concurrent = concurrent;
        self
    }

    pub fn requirements(mut self, ids: &[&str]) -> Self {
        self.step
            .requirement_ids
            .extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn hypotheses(mut self, ids: &[&str]) -> Self {
        self.step
            .hypothesis_ids
            .extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn kind_mut(&mut self) -> &mut StepKind {
        &mut self.step.kind
    }

    pub fn build(self) -> Step {
        self.step
    }
}

/// Builder for `ConfigFile`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                engine: EngineSection::default(),
                executor: BTreeMap::new(),
                default: DefaultSection::default(),
            },
        }
    }

    pub fn step_timeout(mut self, value: &str) -> Self {
        self.config.engine.step_timeout = Some(value.to_string());
        self
    }

    pub fn on_dependency_failure(mut self, policy: DependencyFailurePolicy) -> Self {
        self.config.engine.on_dependency_failure = policy;
        self
    }

    pub fn executor(mut self, reference: &str, cmd: &str) -> Self {
        self.config.executor.insert(
            reference.to_string(),
            ExecutorConfig {
                cmd: cmd.to_string(),
            },
        );
        self
    }

    pub fn simulate_unresolved(mut self, on: bool) -> Self {
        self.config.default.simulate_unresolved = on;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
