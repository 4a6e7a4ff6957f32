// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of running tasks
//! itself, so tests can swap in a backend that records dispatch order.
//!
//! - [`BlockingExecutorBackend`] is the production implementation: every
//!   scheduled task runs on Tokio's blocking pool and reports back with a
//!   `TaskCompleted` event.

use std::future::Future;
use std::pin::Pin;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::warn;

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::{PipelineError, Result};

use super::task_runner::run_task;

/// Trait abstracting how scheduled tasks are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks. Each must eventually produce exactly one
    /// `RuntimeEvent::TaskCompleted`.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

pub struct BlockingExecutorBackend {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl BlockingExecutorBackend {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self { runtime_tx }
    }
}

impl ExecutorBackend for BlockingExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            for task in tasks {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let id = task.id.clone();
                    let outcome = match tokio::task::spawn_blocking(move || run_task(&task)).await {
                        Ok(outcome) => outcome,
                        Err(join_err) => TaskOutcome::Failed(PipelineError::Other(anyhow!(
                            "task worker aborted: {join_err}"
                        ))),
                    };

                    if tx
                        .send(RuntimeEvent::TaskCompleted {
                            task: id.clone(),
                            outcome,
                        })
                        .await
                        .is_err()
                    {
                        warn!(task = %id, "runtime gone before completion could be reported");
                    }
                });
            }
            Ok(())
        })
    }
}
