// src/scores/mod.rs

//! Named metric accumulation.
//!
//! The engine owns one [`ScoreRegistry`] per invocation. Tasks see a
//! snapshot in their run context and return new [`ScoreEntry`]s, which the
//! engine merges once the task has finished. The score files on disk are
//! written from the pipeline's shared score log instead, so concurrent tasks
//! never overwrite each other's rows. [`plot`] renders entries as a bar chart.

pub mod plot;

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::target::{Target, TargetExt};

/// Metric name suffix recorded by training runs.
pub const TRAINING_SUFFIX: &str = "_training_score";
/// Metric name suffix recorded by test runs.
pub const TESTING_SUFFIX: &str = "_testing_score";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub value: f64,
}

impl ScoreEntry {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn training(model: &str, value: f64) -> Self {
        Self::new(format!("{model}{TRAINING_SUFFIX}"), value)
    }

    pub fn testing(model: &str, value: f64) -> Self {
        Self::new(format!("{model}{TESTING_SUFFIX}"), value)
    }
}

/// Metric name → value, ordered by name. Re-recording a name overwrites it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreRegistry {
    scores: BTreeMap<String, f64>,
}

impl ScoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: ScoreEntry) {
        self.scores.insert(entry.name, entry.value);
    }

    pub fn merge(&mut self, entries: impl IntoIterator<Item = ScoreEntry>) {
        for entry in entries {
            self.record(entry);
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.scores.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn entries(&self) -> Vec<ScoreEntry> {
        self.scores
            .iter()
            .map(|(name, value)| ScoreEntry::new(name.clone(), *value))
            .collect()
    }

    /// Entries whose name ends with `suffix`.
    pub fn entries_with_suffix(&self, suffix: &str) -> Vec<ScoreEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.name.ends_with(suffix))
            .collect()
    }

    /// A registry holding only the entries whose name ends with `suffix`.
    pub fn with_suffix(&self, suffix: &str) -> ScoreRegistry {
        let mut filtered = ScoreRegistry::new();
        filtered.merge(self.entries_with_suffix(suffix));
        filtered
    }

    /// CSV with header `metric,score`, one row per metric.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let names: Vec<String> = self.scores.keys().cloned().collect();
        let values: Vec<f64> = self.scores.values().copied().collect();
        let mut df = DataFrame::new(vec![
            Series::new("metric".into(), names).into_column(),
            Series::new("score".into(), values).into_column(),
        ])?;

        let mut buf = Vec::new();
        CsvWriter::new(&mut buf).include_header(true).finish(&mut df)?;
        Ok(buf)
    }

    /// Rewrite `target` with the current contents.
    pub fn persist(&self, target: &dyn Target) -> Result<()> {
        target.write_bytes(&self.to_csv_bytes()?)
    }
}
