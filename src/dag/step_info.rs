// src/dag/step_info.rs

//! Per-run step state.

use serde::{Deserialize, Serialize};

use crate::plan::StepType;
use crate::types::StepId;

/// State of a step within a single plan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    /// Waiting for its wave.
    Pending,
    /// Dispatched to its executor.
    Running,
    /// Executor returned successfully.
    Done,
    /// Executor failed, timed out or panicked.
    Failed,
    /// Not dispatched because a dependency failed (skip policy only).
    Skipped,
}

impl StepState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepState::Done | StepState::Failed | StepState::Skipped)
    }

    /// Terminal without having produced outputs.
    pub fn is_unsuccessful(&self) -> bool {
        matches!(self, StepState::Failed | StepState::Skipped)
    }
}

/// Static step information plus its state for the current run.
#[derive(Debug, Clone)]
pub struct StepInfo {
    pub id: StepId,
    pub step_type: StepType,
    pub depth: usize,
    /// Direct dependencies (`dependencyIds`).
    pub deps: Vec<StepId>,
    pub state: StepState,
}

/// Result of an executor call, as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCompletion {
    Success,
    Failed,
}
