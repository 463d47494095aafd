// src/dag/mod.rs

//! DAG representation, analysis and per-run scheduling.
//!
//! - [`graph`] holds the adjacency view of a plan's steps.
//! - [`topology`] derives entry/exit points, the topological order, the
//!   depth-based parallel groups and the critical path.
//! - [`scheduler`] is the per-run state machine that hands out waves and
//!   records step completions.
//! - [`step_info`] provides per-run step state types.

pub mod graph;
pub mod scheduler;
pub mod step_info;
pub mod topology;

pub use graph::DagGraph;
pub use scheduler::{Scheduler, SkippedStep, Wave};
pub use step_info::{StepCompletion, StepInfo, StepState};
pub use topology::{analyze, analyze_graph, ParallelGroup, Topology};
