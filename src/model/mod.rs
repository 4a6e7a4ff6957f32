// src/model/mod.rs

//! Classifiers used by the training and testing tasks.
//!
//! Fitting and scoring return their metric as a [`ScoreEntry`] instead of
//! registering it anywhere; the caller decides where it goes.

pub mod logistic;
pub mod naive_bayes;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{PipelineError, Result};
use crate::scores::ScoreEntry;

pub use logistic::LogisticRegression;
pub use naive_bayes::GaussianNb;

pub trait Classifier {
    /// Number of features the model was fitted on.
    fn n_features(&self) -> usize;

    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64>;

    /// Accuracy of `predict(x)` against `y`; 0 for an empty set.
    fn score(&self, x: &[Vec<f64>], y: &[f64]) -> f64 {
        accuracy(&self.predict(x), y)
    }
}

pub fn accuracy(predicted: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    correct as f64 / actual.len() as f64
}

/// Model families the pipeline can train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    LogisticRegression,
    GaussianNb,
}

impl ModelKind {
    pub const CHOICES: &'static [&'static str] = &["LogisticRegression", "GaussianNb"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "LogisticRegression",
            ModelKind::GaussianNb => "GaussianNb",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "LogisticRegression" => Ok(ModelKind::LogisticRegression),
            "GaussianNb" => Ok(ModelKind::GaussianNb),
            other => Err(format!(
                "unknown model '{other}' (expected one of {:?})",
                ModelKind::CHOICES
            )),
        }
    }
}

/// A fitted model in its persisted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FittedModel {
    LogisticRegression(LogisticRegression),
    GaussianNb(GaussianNb),
}

impl FittedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            FittedModel::LogisticRegression(_) => ModelKind::LogisticRegression,
            FittedModel::GaussianNb(_) => ModelKind::GaussianNb,
        }
    }

    fn classifier(&self) -> &dyn Classifier {
        match self {
            FittedModel::LogisticRegression(m) => m,
            FittedModel::GaussianNb(m) => m,
        }
    }

    /// Accuracy on `(x, y)`; rows must have the fitted feature count.
    pub fn score(&self, x: &[Vec<f64>], y: &[f64]) -> Result<f64> {
        let model = self.classifier();
        check_shape(x, y, Some(model.n_features()))?;
        Ok(model.score(x, y))
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        let model = self.classifier();
        if let Some(row) = x.iter().find(|r| r.len() != model.n_features()) {
            return Err(PipelineError::Model(format!(
                "expected {} features, got {}",
                model.n_features(),
                row.len()
            )));
        }
        Ok(model.predict(x))
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Result of [`fit_model`].
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub model: FittedModel,
    pub name: String,
    pub training_score: f64,
}

impl FitOutcome {
    pub fn score_entry(&self) -> ScoreEntry {
        ScoreEntry::training(&self.name, self.training_score)
    }
}

fn check_shape(x: &[Vec<f64>], y: &[f64], n_features: Option<usize>) -> Result<()> {
    if x.len() != y.len() {
        return Err(PipelineError::Model(format!(
            "{} feature rows but {} labels",
            x.len(),
            y.len()
        )));
    }
    let width = n_features.or_else(|| x.first().map(Vec::len)).unwrap_or(0);
    if let Some(row) = x.iter().find(|r| r.len() != width) {
        return Err(PipelineError::Model(format!(
            "expected {width} features, got {}",
            row.len()
        )));
    }
    Ok(())
}

/// Fit a `kind` model on `(x, y)` and report its accuracy on the same data.
pub fn fit_model(kind: ModelKind, x: &[Vec<f64>], y: &[f64]) -> Result<FitOutcome> {
    check_shape(x, y, None)?;
    if x.is_empty() {
        return Err(PipelineError::Model(format!(
            "cannot fit {kind} on an empty training set"
        )));
    }

    let model = match kind {
        ModelKind::LogisticRegression => {
            FittedModel::LogisticRegression(LogisticRegression::fit(x, y)?)
        }
        ModelKind::GaussianNb => FittedModel::GaussianNb(GaussianNb::fit(x, y)?),
    };
    let training_score = model.score(x, y)?;
    info!(model = %kind, rows = x.len(), training_score, "fitted model");

    Ok(FitOutcome {
        model,
        name: kind.to_string(),
        training_score,
    })
}

/// Accuracy of an already fitted model, as a `<name>_testing_score` entry.
pub fn model_performance(
    name: &str,
    model: &FittedModel,
    x: &[Vec<f64>],
    y: &[f64],
) -> Result<ScoreEntry> {
    let score = model.score(x, y)?;
    info!(model = name, rows = x.len(), score, "scored model");
    Ok(ScoreEntry::testing(name, score))
}

/// Distinct label values in ascending order.
pub(crate) fn classes_of(y: &[f64]) -> Vec<f64> {
    let mut classes: Vec<f64> = y.to_vec();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();
    classes
}
