// src/dag/mod.rs

//! Dependency graph resolution and scheduling.
//!
//! - [`graph`] discovers a root set's prerequisites and holds them as a
//!   deduplicated, acyclic graph in execution order.
//! - [`scheduler`] contains the per-run state machine that decides which
//!   tasks are ready to run.
//! - [`task_info`] provides task metadata and scheduled task types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::TaskGraph;
pub use scheduler::{Completion, Scheduler};
pub use scheduler_step::SchedulerStep;
pub use task_info::{RunState, ScheduledTask};
