// src/plan/mod.rs

//! The plan document: typed DAG model, loading and structural validation.
//!
//! - [`model`] defines the `Plan` / `Step` data model.
//! - [`loader`] reads plan documents (JSON or TOML).
//! - [`validate`] checks referential integrity, acyclicity and
//!   type-specific required fields, producing a [`ValidationReport`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_plan, load_plan_with, parse_plan, PlanFormat};
pub use model::{
    DataSlot, DevelopSpec, ExecutorKind, ExecutorRef, ExperimentMode, ExperimentSpec, Hypothesis,
    HypothesisStatus, Plan, Priority, Requirement, ResearchSpec, Step, StepKind, StepType,
    SynthesisMode, SynthesizeSpec,
};
pub use validate::{validate_plan, ValidationCode, ValidationIssue, ValidationReport};
