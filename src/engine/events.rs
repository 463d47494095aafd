// src/engine/events.rs

//! Progress events emitted while a plan runs.
//!
//! Events serialize as internally tagged JSON objects with camelCase
//! fields, e.g. `{"type":"step-complete","stepId":"S1","stepType":"research","durationMs":12}`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::plan::StepType;
use crate::types::StepId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum PlanEvent {
    PlanStart {
        plan_id: String,
        total_steps: usize,
        critical_path_length: usize,
        parallel_group_count: usize,
    },
    StepStart {
        step_id: StepId,
        step_type: StepType,
        description: String,
        depth: usize,
    },
    StepComplete {
        step_id: StepId,
        step_type: StepType,
        duration_ms: u64,
    },
    StepError {
        step_id: StepId,
        step_type: StepType,
        error: String,
        duration_ms: u64,
        /// Set when the step never ran because a dependency failed.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        skipped: bool,
    },
    /// Emitted after every wave. `to_depth` is `None` after the last wave.
    DepthTransition {
        from_depth: usize,
        to_depth: Option<usize>,
        steps_completed: usize,
        steps_failed: usize,
    },
    Progress {
        completed_steps: usize,
        total_steps: usize,
    },
    PlanComplete {
        plan_id: String,
        success: bool,
        total_duration_ms: u64,
        steps_completed: usize,
        steps_failed: usize,
        steps_skipped: usize,
    },
}

impl PlanEvent {
    /// The `type` tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            PlanEvent::PlanStart { .. } => "plan-start",
            PlanEvent::StepStart { .. } => "step-start",
            PlanEvent::StepComplete { .. } => "step-complete",
            PlanEvent::StepError { .. } => "step-error",
            PlanEvent::DepthTransition { .. } => "depth-transition",
            PlanEvent::Progress { .. } => "progress",
            PlanEvent::PlanComplete { .. } => "plan-complete",
        }
    }

    /// Step the event is about, if any.
    pub fn step_id(&self) -> Option<&str> {
        match self {
            PlanEvent::StepStart { step_id, .. }
            | PlanEvent::StepComplete { step_id, .. }
            | PlanEvent::StepError { step_id, .. } => Some(step_id),
            _ => None,
        }
    }
}

/// Sending half of the event stream, shared by the run loop and step tasks.
///
/// Sends never wait on the consumer, so a caller may await the run before
/// reading any event. Once the consumer drops its receiver, further events
/// are discarded and the run carries on.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<PlanEvent>,
    closed: Arc<AtomicBool>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<PlanEvent>) -> Self {
        Self {
            tx,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn emit(&self, event: PlanEvent) {
        if self.closed.load(Ordering::Relaxed) {
            return;
        }
        debug!(event = event.kind(), step = ?event.step_id(), "emit");
        if self.tx.send(event).is_err() && !self.closed.swap(true, Ordering::Relaxed) {
            warn!("event consumer went away; continuing without events");
        }
    }
}
