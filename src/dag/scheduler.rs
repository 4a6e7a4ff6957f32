// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::task::TaskId;

/// How a dispatched task ended, as far as scheduling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Ran,
    Skipped,
    Failed,
}

/// Holds the resolved graph plus the state of the single run over it.
///
/// It is responsible for:
/// - dispatching ready tasks in execution order, at most `capacity` at once
/// - marking tasks as succeeded, skipped or failed
/// - stopping further dispatch once any task has failed
#[derive(Debug)]
pub struct Scheduler {
    graph: TaskGraph,
    tasks: HashMap<TaskId, TaskInfo>,
    capacity: usize,
    aborted: bool,
}

impl Scheduler {
    /// `capacity` is the number of tasks that may run concurrently (min 1).
    pub fn new(graph: TaskGraph, capacity: usize) -> Self {
        let mut tasks = HashMap::with_capacity(graph.len());
        for (rank, task) in graph.execution_order().into_iter().enumerate() {
            let id = task.id().clone();
            let deps = graph.dependencies_of(&id);
            tasks.insert(
                id.clone(),
                TaskInfo {
                    id,
                    task: task.clone(),
                    rank,
                    deps,
                    run_state: RunState::Pending,
                },
            );
        }

        Self {
            graph,
            tasks,
            capacity: capacity.max(1),
            aborted: false,
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn run_state_of(&self, id: &TaskId) -> Option<RunState> {
        self.tasks.get(id).map(|info| info.run_state)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Nothing is running and nothing more will be dispatched.
    pub fn is_finished(&self) -> bool {
        let running = self.state_count(RunState::Running);
        let pending = self.state_count(RunState::Pending);
        running == 0 && (self.aborted || pending == 0)
    }

    fn state_count(&self, state: RunState) -> usize {
        self.tasks.values().filter(|i| i.run_state == state).count()
    }

    /// First dispatch of the run.
    pub fn start(&mut self) -> SchedulerStep {
        let newly_scheduled = self.collect_ready();
        debug!(ready = newly_scheduled.len(), total = self.tasks.len(), "scheduler started");
        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished: self.is_finished(),
        }
    }

    /// Production API: record a completion and return newly ready tasks.
    pub fn handle_completion(&mut self, id: &TaskId, completion: Completion) -> Vec<ScheduledTask> {
        self.step_completion(id, completion).newly_scheduled
    }

    /// Record a completion and return the full [`SchedulerStep`].
    pub fn step_completion(&mut self, id: &TaskId, completion: Completion) -> SchedulerStep {
        let mut newly_failed = Vec::new();

        match self.tasks.get_mut(id) {
            Some(info) if info.run_state == RunState::Running => match completion {
                Completion::Ran => {
                    info.run_state = RunState::DoneSuccess;
                    debug!(task = %id, "task completed");
                }
                Completion::Skipped => {
                    info.run_state = RunState::DoneSkipped;
                    debug!(task = %id, "task already complete");
                }
                Completion::Failed => {
                    info.run_state = RunState::DoneFailed;
                    warn!(task = %id, "task failed; no further tasks will be dispatched");
                    newly_failed.push(id.clone());
                    self.aborted = true;
                    let mut manager = StateManager::new(&self.graph, &mut self.tasks);
                    newly_failed.extend(manager.mark_dependents_failed(id));
                }
            },
            Some(info) => {
                warn!(task = %id, state = ?info.run_state, "completion for task that is not running; ignoring");
            }
            None => {
                warn!(task = %id, "completion for unknown task; ignoring");
            }
        }

        let newly_scheduled = self.collect_ready();
        let run_just_finished = self.is_finished();
        if run_just_finished {
            info!(aborted = self.aborted, "scheduler: run finished");
        }

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished,
        }
    }

    fn collect_ready(&mut self) -> Vec<ScheduledTask> {
        if self.aborted {
            return Vec::new();
        }
        let mut manager = StateManager::new(&self.graph, &mut self.tasks);
        let slots = self.capacity.saturating_sub(manager.count_in(RunState::Running));
        manager.collect_new_ready_tasks(slots)
    }
}
