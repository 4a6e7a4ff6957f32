// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::task_info::ScheduledTask;
use crate::task::TaskId;

/// Structured result of a single scheduler "step".
///
/// Tests can step the scheduler by hand and assert on what changed.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became ready to run as a result of this step.
    pub newly_scheduled: Vec<ScheduledTask>,
    /// Tasks newly marked failed: the failing task and any blocked dependents.
    pub newly_failed: Vec<TaskId>,
    /// Whether this step ended the run.
    pub run_just_finished: bool,
}
