// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`task_runner`] runs one scheduled task and turns the result into a
//!   `TaskOutcome`.
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `BlockingExecutorBackend` the engine uses in production.

pub mod backend;
pub mod task_runner;

pub use backend::{BlockingExecutorBackend, ExecutorBackend};
pub use task_runner::run_task;
