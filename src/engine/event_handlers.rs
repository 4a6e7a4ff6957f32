// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{error, info};

use crate::dag::{Completion, ScheduledTask, Scheduler};
use crate::engine::TaskOutcome;
use crate::errors::PipelineError;
use crate::scores::ScoreRegistry;
use crate::task::TaskId;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Nothing is running and nothing more will be dispatched.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Mutable bookkeeping of one invocation, owned by the core.
#[derive(Debug, Default)]
pub struct RunRecord {
    pub scores: ScoreRegistry,
    pub executed: Vec<TaskId>,
    pub skipped: Vec<TaskId>,
    /// First failure observed; later ones are only logged.
    pub failure: Option<PipelineError>,
}

/// Turn newly ready tasks into a dispatch command carrying a score snapshot.
pub fn dispatch_command(
    mut ready: Vec<ScheduledTask>,
    scores: &ScoreRegistry,
) -> Option<CoreCommand> {
    if ready.is_empty() {
        return None;
    }
    for task in &mut ready {
        task.scores = scores.clone();
    }
    Some(CoreCommand::DispatchTasks(ready))
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    record: &mut RunRecord,
    task: TaskId,
    outcome: TaskOutcome,
) -> CoreStep {
    let completion = match outcome {
        TaskOutcome::Success(report) => {
            info!(task = %task, scores = report.scores.len(), "task succeeded");
            record.scores.merge(report.scores);
            record.executed.push(task.clone());
            Completion::Ran
        }
        TaskOutcome::AlreadyComplete => {
            info!(task = %task, "task already complete; skipped");
            record.skipped.push(task.clone());
            Completion::Skipped
        }
        TaskOutcome::Failed(err) => {
            error!(task = %task, error = %err, "task failed");
            if record.failure.is_none() {
                record.failure = Some(PipelineError::task_failed(&task, err));
            }
            Completion::Failed
        }
    };

    let step = scheduler.step_completion(&task, completion);

    let mut commands = Vec::new();
    if let Some(cmd) = dispatch_command(step.newly_scheduled, &record.scores) {
        commands.push(cmd);
    }

    let keep_running = !scheduler.is_finished();
    if !keep_running {
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
