// src/exec/task_runner.rs

//! Runs one scheduled task synchronously.

use std::time::Instant;

use tracing::{error, info};

use crate::dag::ScheduledTask;
use crate::engine::TaskOutcome;
use crate::errors::{PipelineError, Result};
use crate::target::Target;
use crate::task::RunContext;

/// Run `scheduled` unless its outputs already exist.
///
/// - complete at dispatch: `AlreadyComplete`, the run behaviour is not called
/// - external and incomplete: `NotFound`
/// - otherwise run, then require every declared output to exist
pub fn run_task(scheduled: &ScheduledTask) -> TaskOutcome {
    match run_task_inner(scheduled) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(task = %scheduled.id, error = %err, "task execution error");
            TaskOutcome::Failed(err)
        }
    }
}

fn run_task_inner(scheduled: &ScheduledTask) -> Result<TaskOutcome> {
    let task = scheduled.task.as_ref();

    if task.complete() {
        return Ok(TaskOutcome::AlreadyComplete);
    }

    if task.is_external() {
        let missing: Vec<String> = task.output().values().iter().map(|t| t.path()).collect();
        return Err(PipelineError::NotFound(format!(
            "external task {} has no output at {}",
            scheduled.id,
            missing.join(", ")
        )));
    }

    let ctx = RunContext::for_task(task, scheduled.scores.clone())?;
    info!(task = %scheduled.id, signature = %scheduled.id.signature(), "running task");
    let started = Instant::now();
    let report = task.run(&ctx)?;

    if !task.complete() {
        let outputs = task.output();
        let mut missing: Vec<String> = outputs
            .values()
            .iter()
            .filter(|t| !t.exists())
            .map(|t| t.path())
            .collect();
        if outputs.is_empty() {
            missing.push(format!("{} declares no outputs", scheduled.id));
        }
        return Err(PipelineError::Incomplete(missing));
    }

    info!(
        task = %scheduled.id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "task finished"
    );
    Ok(TaskOutcome::Success(report))
}
