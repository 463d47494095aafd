// src/engine/mod.rs

//! Compilation and execution of plans.
//!
//! - [`compiler`] validates a plan, binds executors and precomputes the
//!   topology, producing an [`ExecutableWorkflow`].
//! - [`runtime`] runs a workflow wave by wave on Tokio. The per-run state
//!   machine itself is [`crate::dag::Scheduler`]; the runtime is the IO shell
//!   around it.
//! - [`events`] defines the [`PlanEvent`] stream.
//! - [`store`] holds the per-run output store.

pub mod compiler;
pub mod events;
pub mod runtime;
pub mod store;

pub use crate::config::EngineConfig;
pub use compiler::{Compiler, CompiledStep, ExecutableWorkflow};
pub use events::{EventSink, PlanEvent};
pub use runtime::{PlanRun, RunSummary, StepOutcome};
pub use store::OutputStore;
