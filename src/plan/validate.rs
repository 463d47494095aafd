// src/plan/validate.rs

//! Structural validation of a [`Plan`].
//!
//! Validation accumulates every problem instead of stopping at the first one,
//! so a planner can fix a document in a single pass. Checks run in a fixed
//! order:
//! 1. duplicate step ids
//! 2. dependencies on unknown steps
//! 3. dependency cycles (three-colour DFS)
//! 4. unknown requirement / hypothesis references
//! 5. type-specific required fields

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::plan::model::{ExperimentMode, Plan, Step, StepKind, SynthesisMode};
use crate::types::StepId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    DuplicateStepId,
    UnknownDependency,
    CycleDetected,
    UnknownRequirement,
    UnknownHypothesis,
    MissingRequiredField,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::DuplicateStepId => "DUPLICATE_STEP_ID",
            ValidationCode::UnknownDependency => "UNKNOWN_DEPENDENCY",
            ValidationCode::CycleDetected => "CYCLE_DETECTED",
            ValidationCode::UnknownRequirement => "UNKNOWN_REQUIREMENT",
            ValidationCode::UnknownHypothesis => "UNKNOWN_HYPOTHESIS",
            ValidationCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
        }
    }

    /// Whether the issue breaks the DAG itself (as opposed to dangling
    /// cross-references into requirements/hypotheses).
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            ValidationCode::UnknownRequirement | ValidationCode::UnknownHypothesis
        )
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub code: ValidationCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<StepId>,
}

impl ValidationIssue {
    fn for_step(code: ValidationCode, step_id: &str, message: String) -> Self {
        Self {
            code,
            message,
            step_id: Some(step_id.to_string()),
        }
    }
}

/// Result of [`validate_plan`]. `valid` is true iff `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn has_code(&self, code: ValidationCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn issues_with_code(&self, code: ValidationCode) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().filter(move |e| e.code == code)
    }

    /// One-line description used in error messages.
    pub fn summary(&self) -> String {
        if self.valid {
            return "no issues".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validate a plan and return a report listing every issue found.
pub fn validate_plan(plan: &Plan) -> ValidationReport {
    let mut issues = Vec::new();

    check_duplicate_ids(plan, &mut issues);
    check_dependencies_exist(plan, &mut issues);
    check_cycles(plan, &mut issues);
    check_cross_references(plan, &mut issues);
    for step in &plan.steps {
        check_required_fields(step, &mut issues);
    }

    debug!(
        plan_id = %plan.id,
        issues = issues.len(),
        "plan validation finished"
    );

    ValidationReport::from_issues(issues)
}

fn check_duplicate_ids(plan: &Plan, issues: &mut Vec<ValidationIssue>) {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<&str> = HashSet::new();

    for step in &plan.steps {
        if !seen.insert(step.id.as_str()) && reported.insert(step.id.as_str()) {
            issues.push(ValidationIssue::for_step(
                ValidationCode::DuplicateStepId,
                &step.id,
                format!("step id '{}' is used by more than one step", step.id),
            ));
        }
    }
}

fn check_dependencies_exist(plan: &Plan, issues: &mut Vec<ValidationIssue>) {
    let known: HashSet<&str> = plan.step_ids().collect();

    for step in &plan.steps {
        for dep in &step.dependency_ids {
            if !known.contains(dep.as_str()) {
                issues.push(ValidationIssue::for_step(
                    ValidationCode::UnknownDependency,
                    &step.id,
                    format!("step '{}' depends on unknown step '{}'", step.id, dep),
                ));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first cycle search following `dependency_ids` edges.
///
/// Each back-edge to an in-progress step yields one `CYCLE_DETECTED` issue on
/// the step whose dependency closes the cycle.
fn check_cycles(plan: &Plan, issues: &mut Vec<ValidationIssue>) {
    // With duplicated ids only the first declaration participates; the
    // duplicate itself is already reported.
    let mut deps: HashMap<&str, &[StepId]> = HashMap::new();
    for step in &plan.steps {
        deps.entry(step.id.as_str())
            .or_insert(step.dependency_ids.as_slice());
    }

    let mut marks: HashMap<&str, Mark> = deps.keys().map(|id| (*id, Mark::Unvisited)).collect();
    let mut path: Vec<&str> = Vec::new();

    for step in &plan.steps {
        if marks.get(step.id.as_str()) == Some(&Mark::Unvisited) {
            visit(step.id.as_str(), &deps, &mut marks, &mut path, issues);
        }
    }
}

fn visit<'a>(
    node: &'a str,
    deps: &HashMap<&'a str, &'a [StepId]>,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
    issues: &mut Vec<ValidationIssue>,
) {
    marks.insert(node, Mark::InProgress);
    path.push(node);

    let node_deps = deps.get(node).copied().unwrap_or(&[]);
    for dep in node_deps {
        let dep = dep.as_str();
        match marks.get(dep).copied() {
            // Unknown dependency; reported separately.
            None => {}
            Some(Mark::Unvisited) => visit(dep, deps, marks, path, issues),
            Some(Mark::InProgress) => {
                let start = path.iter().position(|p| *p == dep).unwrap_or(0);
                let mut cycle: Vec<&str> = path[start..].to_vec();
                cycle.push(dep);
                issues.push(ValidationIssue::for_step(
                    ValidationCode::CycleDetected,
                    node,
                    format!(
                        "step '{}' is part of a dependency cycle: {}",
                        node,
                        cycle.join(" -> ")
                    ),
                ));
            }
            Some(Mark::Done) => {}
        }
    }

    path.pop();
    marks.insert(node, Mark::Done);
}

fn check_cross_references(plan: &Plan, issues: &mut Vec<ValidationIssue>) {
    let requirements: HashSet<&str> = plan.requirements.iter().map(|r| r.id.as_str()).collect();
    let hypotheses: HashSet<&str> = plan.hypotheses.iter().map(|h| h.id.as_str()).collect();

    for step in &plan.steps {
        for req in &step.requirement_ids {
            if !requirements.contains(req.as_str()) {
                issues.push(ValidationIssue::for_step(
                    ValidationCode::UnknownRequirement,
                    &step.id,
                    format!("step '{}' references unknown requirement '{}'", step.id, req),
                ));
            }
        }
        for hyp in &step.hypothesis_ids {
            if !hypotheses.contains(hyp.as_str()) {
                issues.push(ValidationIssue::for_step(
                    ValidationCode::UnknownHypothesis,
                    &step.id,
                    format!("step '{}' references unknown hypothesis '{}'", step.id, hyp),
                ));
            }
        }
    }
}

fn check_required_fields(step: &Step, issues: &mut Vec<ValidationIssue>) {
    let mut missing = |field: &str| {
        issues.push(ValidationIssue::for_step(
            ValidationCode::MissingRequiredField,
            &step.id,
            format!(
                "{} step '{}' is missing required field '{}'",
                step.step_type(),
                step.id,
                field
            ),
        ));
    };

    if step.executor.id.trim().is_empty() {
        missing("executor.id");
    }

    match &step.kind {
        StepKind::Research(spec) => {
            if spec.query.trim().is_empty() {
                missing("query");
            }
        }
        StepKind::Synthesize(spec) => match spec.mode {
            None => missing("mode"),
            Some(SynthesisMode::Evaluate) if spec.evaluate_against.is_empty() => {
                missing("evaluateAgainst")
            }
            Some(_) => {}
        },
        StepKind::Experiment(spec) => match spec.mode {
            None => missing("mode"),
            Some(ExperimentMode::Confirmatory) if spec.preregistered_commitments.is_empty() => {
                missing("preregisteredCommitments")
            }
            Some(_) => {}
        },
        StepKind::Develop(spec) => {
            if spec.specification.trim().is_empty() {
                missing("specification");
            }
        }
    }
}
