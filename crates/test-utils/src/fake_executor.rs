use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use heartflow::dag::ScheduledTask;
use heartflow::engine::RuntimeEvent;
use heartflow::exec::{run_task, ExecutorBackend};
use heartflow::errors::Result;

/// An executor that:
/// - runs each scheduled task inline, on the runtime's own thread
/// - records the dispatch order of task ids
/// - reports the outcome straight back as `TaskCompleted`.
pub struct RecordingExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<String>>>,
}

impl RecordingExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        dispatched: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self { runtime_tx, dispatched }
    }
}

impl ExecutorBackend for RecordingExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = dispatched.lock().unwrap();
                    guard.push(t.id.to_string());
                }

                let outcome = run_task(&t);
                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.id.clone(),
                    outcome,
                })
                .await
                .map_err(|e| anyhow::anyhow!("runtime channel closed: {e}"))?;
            }
            Ok(())
        })
    }
}
