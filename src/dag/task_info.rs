// src/dag/task_info.rs

//! Task metadata and per-run state.

use crate::scores::ScoreRegistry;
use crate::task::{TaskId, TaskRef};

/// Per-run state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting on prerequisites.
    Pending,
    /// Dispatched to the executor.
    Running,
    /// Ran and produced its outputs.
    DoneSuccess,
    /// Outputs already existed at dispatch time; not run.
    DoneSkipped,
    /// Failed, or blocked by a failed prerequisite.
    DoneFailed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Pending | RunState::Running)
    }

    /// Whether dependents may start.
    pub fn satisfies_dependents(&self) -> bool {
        matches!(self, RunState::DoneSuccess | RunState::DoneSkipped)
    }
}

/// Static information about a resolved task plus its run state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub id: TaskId,
    pub task: TaskRef,
    /// Position in the graph's execution order; lower runs first.
    pub rank: usize,
    /// Direct prerequisites.
    pub deps: Vec<TaskId>,
    pub run_state: RunState,
}

/// A task the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub task: TaskRef,
    pub rank: usize,
    /// Registry snapshot taken at dispatch.
    pub scores: ScoreRegistry,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo) -> Self {
        Self {
            id: info.id.clone(),
            task: info.task.clone(),
            rank: info.rank,
            scores: ScoreRegistry::default(),
        }
    }
}
