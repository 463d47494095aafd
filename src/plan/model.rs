// src/plan/model.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::StepId;

/// A goal decomposed into a DAG of typed steps, as produced by a planner.
///
/// Field names follow the planner's camelCase document format:
///
/// ```json
/// {
///   "id": "plan-1",
///   "goalSummary": "Compare embedding models",
///   "requirements": [{ "id": "R1", "description": "...", "priority": "must" }],
///   "steps": [
///     {
///       "type": "research",
///       "id": "S1",
///       "description": "Survey existing benchmarks",
///       "query": "embedding benchmarks",
///       "executor": { "kind": "agent", "id": "researcher" }
///     }
///   ]
/// }
/// ```
///
/// The scheduler treats a plan as immutable input data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,

    #[serde(default)]
    pub goal_summary: String,

    #[serde(default)]
    pub requirements: Vec<Requirement>,

    #[serde(default)]
    pub hypotheses: Vec<Hypothesis>,

    #[serde(default)]
    pub steps: Vec<Step>,

    /// Epistemic bookkeeping for external scorers; opaque to the scheduler.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub unknowns_map: serde_json::Value,
}

impl Plan {
    /// Look up a step by id (first match if ids are duplicated).
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Must,
    Should,
    Could,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub description: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HypothesisStatus {
    #[default]
    Untested,
    Testing,
    Supported,
    Refuted,
    Inconclusive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: String,
    pub statement: String,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub status: HypothesisStatus,
}

/// Kind of worker that performs a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    Agent,
    Tool,
    Workflow,
    Human,
}

impl ExecutorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorKind::Agent => "agent",
            ExecutorKind::Tool => "tool",
            ExecutorKind::Workflow => "workflow",
            ExecutorKind::Human => "human",
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "agent" => Ok(ExecutorKind::Agent),
            "tool" => Ok(ExecutorKind::Tool),
            "workflow" => Ok(ExecutorKind::Workflow),
            "human" => Ok(ExecutorKind::Human),
            other => Err(format!(
                "invalid executor kind: {other} (expected agent, tool, workflow or human)"
            )),
        }
    }
}

/// Reference to the executor a step is bound to, written `kind:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExecutorRef {
    pub kind: ExecutorKind,
    #[serde(alias = "ref")]
    pub id: String,
}

impl ExecutorRef {
    pub fn new(kind: ExecutorKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for ExecutorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for ExecutorRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("executor reference '{s}' must be written as <kind>:<id>"))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(format!("executor reference '{s}' has an empty id"));
        }
        Ok(Self {
            kind: kind.parse()?,
            id: id.to_string(),
        })
    }
}

/// A named data slot, produced by one step and consumed by its dependents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSlot {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DataSlot {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

fn default_concurrent() -> bool {
    true
}

/// A single unit of work in the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: StepId,

    #[serde(default)]
    pub description: String,

    /// Steps that must reach a terminal state before this one starts.
    #[serde(default)]
    pub dependency_ids: Vec<StepId>,

    #[serde(default)]
    pub requirement_ids: Vec<String>,

    #[serde(default)]
    pub hypothesis_ids: Vec<String>,

    #[serde(default)]
    pub inputs: Vec<DataSlot>,

    #[serde(default)]
    pub outputs: Vec<DataSlot>,

    pub executor: ExecutorRef,

    /// Advisory only: surfaced in the topology, never used to gate dispatch.
    #[serde(default = "default_concurrent")]
    pub concurrent: bool,

    #[serde(flatten)]
    pub kind: StepKind,
}

impl Step {
    pub fn step_type(&self) -> StepType {
        self.kind.step_type()
    }
}

/// Type-specific payload of a step; the `type` field is the discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StepKind {
    Research(ResearchSpec),
    Synthesize(SynthesizeSpec),
    Experiment(ExperimentSpec),
    Develop(DevelopSpec),
}

impl StepKind {
    pub fn step_type(&self) -> StepType {
        match self {
            StepKind::Research(_) => StepType::Research,
            StepKind::Synthesize(_) => StepType::Synthesize,
            StepKind::Experiment(_) => StepType::Experiment,
            StepKind::Develop(_) => StepType::Develop,
        }
    }
}

/// Bare discriminant of [`StepKind`], used in events and requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Research,
    Synthesize,
    Experiment,
    Develop,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Research => "research",
            StepType::Synthesize => "synthesize",
            StepType::Experiment => "experiment",
            StepType::Develop => "develop",
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchSpec {
    #[serde(default)]
    pub query: String,
    /// When the research is considered sufficient.
    #[serde(default)]
    pub stopping_rule: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    Integrate,
    Evaluate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeSpec {
    #[serde(default)]
    pub mode: Option<SynthesisMode>,
    /// Criteria an `evaluate` synthesis judges against.
    #[serde(default)]
    pub evaluate_against: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentMode {
    Exploratory,
    Confirmatory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentSpec {
    #[serde(default)]
    pub mode: Option<ExperimentMode>,
    #[serde(default)]
    pub procedure: String,
    #[serde(default)]
    pub expected_outcomes: Vec<String>,
    #[serde(default)]
    pub success_criteria: Vec<String>,
    /// Required (non-empty) for confirmatory experiments.
    #[serde(default)]
    pub preregistered_commitments: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevelopSpec {
    #[serde(default)]
    pub specification: String,
    #[serde(default)]
    pub deliverables: Vec<String>,
}
