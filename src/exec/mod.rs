// src/exec/mod.rs

//! Step execution layer.
//!
//! - [`backend`] defines the [`Executor`] trait and the [`StepRequest`]
//!   handed to every executor.
//! - [`registry`] maps `kind:id` executor references to implementations.
//! - [`command`] runs a step as a shell command (configured per reference
//!   in `Planwave.toml`).
//! - [`simulated`] fabricates outputs for dry walks through a plan.

pub mod backend;
pub mod command;
pub mod registry;
pub mod simulated;

pub use backend::{executor_fn, Executor, ExecutorFuture, FnExecutor, StepRequest};
pub use command::CommandExecutor;
pub use registry::ExecutorRegistry;
pub use simulated::SimulatedExecutor;
