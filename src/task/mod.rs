// src/task/mod.rs

//! Units of pipeline work.
//!
//! - [`params`] declares typed, defaulted parameters and the canonical
//!   [`TaskId`] built from them.
//! - [`bundle`] holds the zero/one/named shape shared by prerequisites,
//!   outputs and resolved inputs.
//!
//! A [`Task`] declares its prerequisites, its output targets, and a `run`
//! behaviour that receives the prerequisites' targets (never their data).

pub mod bundle;
pub mod params;

use std::fmt;
use std::sync::Arc;

pub use bundle::Bundle;
pub use params::{Overrides, ParamKind, ParamSpec, ParamValue, TaskId};

use crate::errors::Result;
use crate::scores::{ScoreEntry, ScoreRegistry};
use crate::target::TargetRef;

pub type TaskRef = Arc<dyn Task>;

pub trait Task: Send + Sync + fmt::Debug {
    fn id(&self) -> &TaskId;

    /// Prerequisite tasks. Built fresh on every call.
    fn requires(&self) -> Result<Bundle<TaskRef>> {
        Ok(Bundle::Empty)
    }

    fn output(&self) -> Bundle<TargetRef>;

    /// External tasks are never run; their output must already exist.
    fn is_external(&self) -> bool {
        false
    }

    fn run(&self, ctx: &RunContext) -> Result<TaskReport>;

    /// Complete iff the task declares outputs and every one of them exists.
    fn complete(&self) -> bool {
        let outputs = self.output();
        !outputs.is_empty() && outputs.values().iter().all(|t| t.exists())
    }
}

/// Metrics produced by one task run, merged into the engine's registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskReport {
    pub scores: Vec<ScoreEntry>,
}

impl TaskReport {
    pub fn with_score(mut self, entry: ScoreEntry) -> Self {
        self.scores.push(entry);
        self
    }
}

/// What a task's `run` gets to see.
#[derive(Debug, Clone)]
pub struct RunContext {
    inputs: Bundle<Bundle<TargetRef>>,
    scores: ScoreRegistry,
}

impl RunContext {
    pub fn new(inputs: Bundle<Bundle<TargetRef>>, scores: ScoreRegistry) -> Self {
        Self { inputs, scores }
    }

    /// Build the context for `task`: its prerequisites mapped to their outputs.
    pub fn for_task(task: &dyn Task, scores: ScoreRegistry) -> Result<Self> {
        let inputs = task.requires()?.map(|dep| dep.output());
        Ok(Self::new(inputs, scores))
    }

    /// Prerequisite outputs, shaped like `requires()`.
    pub fn input(&self) -> &Bundle<Bundle<TargetRef>> {
        &self.inputs
    }

    /// Outputs of the only prerequisite.
    pub fn single_input(&self) -> Result<&Bundle<TargetRef>> {
        self.inputs.expect_single("task input")
    }

    /// Outputs of the prerequisite registered under `key`.
    pub fn named_input(&self, key: &str) -> Result<&Bundle<TargetRef>> {
        self.inputs.expect_named(key, "task input")
    }

    /// Registry snapshot taken when the task was dispatched.
    pub fn scores(&self) -> &ScoreRegistry {
        &self.scores
    }
}
