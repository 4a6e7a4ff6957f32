// src/errors.rs

//! Crate-wide error type and helpers.

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::task::params::ParamError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parameter error: {0}")]
    Param(#[from] ParamError),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("Target not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Data error: {0}")]
    Data(#[from] PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Task {task} failed: {source}")]
    TaskFailed {
        task: String,
        source: Box<PipelineError>,
    },

    #[error("Tasks not complete after run: {}", .0.join(", "))]
    Incomplete(Vec<String>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Wrap an error raised by a task's run behaviour with the task identity.
    pub fn task_failed(task: impl ToString, source: PipelineError) -> Self {
        PipelineError::TaskFailed {
            task: task.to_string(),
            source: Box::new(source),
        }
    }

    /// Errors that are reported before any task executes: malformed
    /// parameters, invalid config, cyclic graphs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PipelineError::ConfigError(_) | PipelineError::Param(_) | PipelineError::DagCycle(_)
        )
    }

    /// True for a missing target, including when wrapped in `TaskFailed`.
    pub fn is_not_found(&self) -> bool {
        match self {
            PipelineError::NotFound(_) => true,
            PipelineError::TaskFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
