// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::dag::TaskGraph;
use crate::task::TaskId;

/// Mutating view over the scheduler's task table.
pub struct StateManager<'a> {
    graph: &'a TaskGraph,
    tasks: &'a mut HashMap<TaskId, TaskInfo>,
}

impl<'a> StateManager<'a> {
    pub fn new(graph: &'a TaskGraph, tasks: &'a mut HashMap<TaskId, TaskInfo>) -> Self {
        Self { graph, tasks }
    }

    /// Mark every pending transitive dependent of `failed_task` as failed.
    ///
    /// Returns the newly failed tasks, excluding `failed_task` itself.
    pub fn mark_dependents_failed(&mut self, failed_task: &TaskId) -> Vec<TaskId> {
        let mut stack = self.graph.dependents_of(failed_task);
        let mut newly_failed = Vec::new();

        while let Some(id) = stack.pop() {
            if let Some(info) = self.tasks.get_mut(&id) {
                if info.run_state == RunState::Pending {
                    info.run_state = RunState::DoneFailed;
                    debug!(task = %info.id, "blocked by failed prerequisite");
                    newly_failed.push(id.clone());
                    stack.extend(self.graph.dependents_of(&id));
                }
            }
        }

        newly_failed
    }

    /// Pending tasks whose prerequisites all succeeded or were skipped,
    /// lowest rank first, up to `slots` of them. Marks them `Running`.
    pub fn collect_new_ready_tasks(&mut self, slots: usize) -> Vec<ScheduledTask> {
        let mut candidates: Vec<(usize, TaskId)> = self
            .tasks
            .values()
            .filter(|info| info.run_state == RunState::Pending && self.deps_satisfied(info))
            .map(|info| (info.rank, info.id.clone()))
            .collect();
        candidates.sort_by_key(|(rank, _)| *rank);

        let mut ready = Vec::new();
        for (_, id) in candidates.into_iter().take(slots) {
            if let Some(info) = self.tasks.get_mut(&id) {
                info!(task = %info.id, "scheduling task");
                info.run_state = RunState::Running;
                ready.push(ScheduledTask::from_task_info(info));
            }
        }
        ready
    }

    fn deps_satisfied(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|dep| {
            self.tasks
                .get(dep)
                .is_some_and(|d| d.run_state.satisfies_dependents())
        })
    }

    pub fn count_in(&self, state: RunState) -> usize {
        self.tasks.values().filter(|i| i.run_state == state).count()
    }
}
