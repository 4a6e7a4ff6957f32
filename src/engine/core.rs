// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes [`RuntimeEvent`]s and produces an updated state plus a
//! list of commands for the IO shell (`engine::runtime::Runtime`). It has
//! no channels, no Tokio types and performs no task IO, except for the
//! final structural completeness check in [`CoreRuntime::finish`].

use tracing::{info, warn};

use crate::dag::Scheduler;
use crate::engine::event_handlers::{dispatch_command, handle_task_completion, RunRecord};
use crate::engine::{CoreCommand, CoreStep, RunSummary, RuntimeEvent};
use crate::errors::{PipelineError, Result};

#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    record: RunRecord,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            record: RunRecord::default(),
        }
    }

    /// Initial dispatch.
    pub fn start(&mut self) -> CoreStep {
        let step = self.scheduler.start();
        let mut commands = Vec::new();
        if let Some(cmd) = dispatch_command(step.newly_scheduled, &self.record.scores) {
            commands.push(cmd);
        }

        let keep_running = !self.scheduler.is_finished();
        if !keep_running {
            commands.push(CoreCommand::RequestExit);
        }
        CoreStep {
            commands,
            keep_running,
        }
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { task, outcome } => {
                handle_task_completion(&mut self.scheduler, &mut self.record, task, outcome)
            }
        }
    }

    /// Conclude the invocation.
    ///
    /// Returns the first task failure if there was one. Otherwise every
    /// task in the graph must now report itself complete.
    pub fn finish(self) -> Result<RunSummary> {
        let RunRecord {
            scores,
            executed,
            skipped,
            failure,
        } = self.record;

        if let Some(err) = failure {
            return Err(err);
        }

        let incomplete: Vec<String> = self
            .scheduler
            .graph()
            .execution_order()
            .into_iter()
            .filter(|task| !task.complete())
            .map(|task| task.id().to_string())
            .collect();
        if !incomplete.is_empty() {
            warn!(?incomplete, "tasks not complete at end of run");
            return Err(PipelineError::Incomplete(incomplete));
        }

        info!(
            executed = executed.len(),
            skipped = skipped.len(),
            scores = scores.len(),
            "build finished"
        );
        Ok(RunSummary {
            executed,
            skipped,
            scores,
        })
    }
}
