#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use heartflow::errors::{PipelineError, Result};
use heartflow::scores::ScoreEntry;
use heartflow::target::{MemoryObjectStore, RemoteTarget, Target, TargetExt, TargetRef};
use heartflow::task::{
    Bundle, Overrides, ParamKind, ParamSpec, RunContext, Task, TaskId, TaskRef, TaskReport,
};
use heartflow::types::Format;

const STUB_SCHEMA: &[ParamSpec] = &[ParamSpec::new("name", ParamKind::Str, "")];
const STUB_ROOT: &str = "mem://stub";

/// Behaviour of one named stub task.
#[derive(Debug, Clone, Default)]
struct StubSpec {
    deps: Vec<String>,
    fail: bool,
    skip_output: bool,
    external: bool,
    score: Option<(String, f64)>,
    delay: Duration,
}

/// A set of named stub tasks sharing one in-memory object store.
///
/// Dependencies are declared by name and looked up when `requires()` is
/// called, so any graph shape (including cycles) can be described.
#[derive(Debug, Clone, Default)]
pub struct StubWorld {
    store: MemoryObjectStore,
    specs: Arc<Mutex<BTreeMap<String, StubSpec>>>,
    events: Arc<Mutex<Vec<String>>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl StubWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start describing the stub `name`; call `done()` to register it.
    pub fn define(&self, name: &str) -> StubBuilder<'_> {
        StubBuilder {
            world: self,
            name: name.to_string(),
            spec: StubSpec::default(),
        }
    }

    /// A fresh task instance for `name`. Undefined names have no deps.
    pub fn task(&self, name: &str) -> TaskRef {
        Arc::new(StubTask::new(self.clone(), name))
    }

    pub fn store(&self) -> &MemoryObjectStore {
        &self.store
    }

    /// Write `name`'s output directly, as if an earlier run produced it.
    pub fn mark_complete(&self, name: &str) {
        self.target(name)
            .write_bytes(b"done")
            .expect("memory store accepts writes");
    }

    pub fn is_complete(&self, name: &str) -> bool {
        self.target(name).exists()
    }

    /// Names whose run behaviour started, in start order.
    pub fn runs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("start:").map(str::to_string))
            .collect()
    }

    /// `start:<name>`, `end:<name>` and `violation:<name>` events in order.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    /// Highest number of stubs running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn spec(&self, name: &str) -> StubSpec {
        self.specs
            .lock()
            .expect("specs lock")
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    fn target(&self, name: &str) -> TargetRef {
        Arc::new(RemoteTarget::new(
            Arc::new(self.store.clone()),
            STUB_ROOT,
            name,
            Format::Text,
        ))
    }

    fn log(&self, event: String) {
        self.events.lock().expect("events lock").push(event);
    }
}

pub struct StubBuilder<'a> {
    world: &'a StubWorld,
    name: String,
    spec: StubSpec,
}

impl StubBuilder<'_> {
    pub fn after(mut self, deps: &[&str]) -> Self {
        self.spec.deps.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    /// Run returns an error without writing output.
    pub fn failing(mut self) -> Self {
        self.spec.fail = true;
        self
    }

    /// Run returns `Ok` but never writes its output.
    pub fn without_output(mut self) -> Self {
        self.spec.skip_output = true;
        self
    }

    pub fn external(mut self) -> Self {
        self.spec.external = true;
        self
    }

    pub fn score(mut self, name: &str, value: f64) -> Self {
        self.spec.score = Some((name.to_string(), value));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.spec.delay = delay;
        self
    }

    pub fn done(self) -> TaskRef {
        self.world
            .specs
            .lock()
            .expect("specs lock")
            .insert(self.name.clone(), self.spec);
        self.world.task(&self.name)
    }
}

/// Test task whose behaviour comes from its [`StubWorld`] entry.
#[derive(Debug)]
pub struct StubTask {
    id: TaskId,
    name: String,
    world: StubWorld,
}

impl StubTask {
    pub fn new(world: StubWorld, name: &str) -> Self {
        let id = TaskId::resolve("Stub", STUB_SCHEMA, &Overrides::new().with("name", name))
            .expect("stub schema accepts any name");
        Self {
            id,
            name: name.to_string(),
            world,
        }
    }
}

impl Task for StubTask {
    fn id(&self) -> &TaskId {
        &self.id
    }

    fn requires(&self) -> Result<Bundle<TaskRef>> {
        let deps = self.world.spec(&self.name).deps;
        if deps.is_empty() {
            return Ok(Bundle::Empty);
        }
        Ok(Bundle::named(
            deps.into_iter().map(|d| {
                let task = self.world.task(&d);
                (d, task)
            }),
        ))
    }

    fn output(&self) -> Bundle<TargetRef> {
        Bundle::Single(self.world.target(&self.name))
    }

    fn is_external(&self) -> bool {
        self.world.spec(&self.name).external
    }

    fn run(&self, ctx: &RunContext) -> Result<TaskReport> {
        let spec = self.world.spec(&self.name);
        self.world.log(format!("start:{}", self.name));
        let running = self.world.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.world.peak.fetch_max(running, Ordering::SeqCst);

        let inputs_ready = ctx
            .input()
            .values()
            .iter()
            .all(|outputs| outputs.values().iter().all(|t| t.exists()));
        if !inputs_ready {
            self.world.log(format!("violation:{}", self.name));
        }

        if !spec.delay.is_zero() {
            std::thread::sleep(spec.delay);
        }

        let result = if spec.fail {
            Err(PipelineError::Storage(format!("stub {} failed", self.name)))
        } else if spec.skip_output {
            Ok(())
        } else {
            self.world.target(&self.name).write_bytes(b"done")
        };

        self.world.active.fetch_sub(1, Ordering::SeqCst);
        self.world.log(format!("end:{}", self.name));
        result?;

        let mut report = TaskReport::default();
        if let Some((name, value)) = spec.score {
            report = report.with_score(ScoreEntry::new(name, value));
        }
        Ok(report)
    }
}
