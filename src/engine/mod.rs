// src/engine/mod.rs

//! Orchestration engine.
//!
//! [`build`] resolves a root set into a [`TaskGraph`](crate::dag::TaskGraph),
//! then runs it: every task whose outputs are missing runs exactly once,
//! after all of its prerequisites, and a failure stops further dispatch.
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::dag::{Scheduler, TaskGraph};
use crate::errors::{PipelineError, Result};
use crate::exec::{BlockingExecutorBackend, ExecutorBackend};
use crate::scores::ScoreRegistry;
use crate::task::{TaskId, TaskReport, TaskRef};

use tokio::sync::mpsc;
use tracing::info;

/// Outcome of one dispatched task.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Ran and produced all of its outputs.
    Success(TaskReport),
    /// Outputs already existed; not run.
    AlreadyComplete,
    Failed(PipelineError),
}

/// Events flowing into the runtime from executors.
#[derive(Debug)]
pub enum RuntimeEvent {
    TaskCompleted { task: TaskId, outcome: TaskOutcome },
}

/// Engine tuning.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Maximum tasks running at once. `1` walks the execution order strictly.
    pub workers: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

/// What a successful invocation did.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Tasks whose run behaviour executed, in completion order.
    pub executed: Vec<TaskId>,
    /// Tasks found complete at dispatch time.
    pub skipped: Vec<TaskId>,
    /// Scores registered during this invocation.
    pub scores: ScoreRegistry,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;

/// Build `roots` and everything they transitively require.
///
/// Graph errors (cycles, bad parameters) are returned before any task runs.
pub async fn build(roots: Vec<TaskRef>, options: EngineOptions) -> Result<RunSummary> {
    build_with_executor(roots, options, BlockingExecutorBackend::new).await
}

/// [`build`] with a caller-supplied backend, constructed from the sender
/// half of the runtime event channel.
pub async fn build_with_executor<E, F>(
    roots: Vec<TaskRef>,
    options: EngineOptions,
    make_executor: F,
) -> Result<RunSummary>
where
    E: ExecutorBackend,
    F: FnOnce(mpsc::Sender<RuntimeEvent>) -> E,
{
    let graph = TaskGraph::resolve(&roots)?;
    info!(tasks = graph.len(), workers = options.workers, "starting build");

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = make_executor(rt_tx);
    let core = CoreRuntime::new(Scheduler::new(graph, options.workers));

    Runtime::new(core, rt_rx, executor).run().await
}
