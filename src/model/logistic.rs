// src/model/logistic.rs

use serde::{Deserialize, Serialize};

use super::{classes_of, Classifier};
use crate::errors::{PipelineError, Result};

const ITERATIONS: usize = 2000;
const LEARNING_RATE: f64 = 0.1;
/// Inverse L2 regularisation strength.
const C: f64 = 1.0;

/// Binary L2-regularised logistic regression with intercept,
/// fitted by full-batch gradient descent from zero weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// `[negative, positive]` label values; a single class is stored twice.
    pub classes: [f64; 2],
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl LogisticRegression {
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        let classes = classes_of(y);
        let n_features = x.first().map(Vec::len).unwrap_or(0);
        let (negative, positive) = match classes.as_slice() {
            [only] => (*only, *only),
            [neg, pos] => (*neg, *pos),
            other => {
                return Err(PipelineError::Model(format!(
                    "logistic regression needs one or two classes, got {}",
                    other.len()
                )));
            }
        };

        let mut model = Self {
            weights: vec![0.0; n_features],
            intercept: 0.0,
            classes: [negative, positive],
        };
        if negative == positive {
            return Ok(model);
        }

        let n = x.len() as f64;
        let targets: Vec<f64> = y.iter().map(|v| if *v == positive { 1.0 } else { 0.0 }).collect();

        for _ in 0..ITERATIONS {
            let mut grad_w = vec![0.0; n_features];
            let mut grad_b = 0.0;
            for (row, t) in x.iter().zip(&targets) {
                let err = sigmoid(model.decision(row)) - t;
                for (g, v) in grad_w.iter_mut().zip(row) {
                    *g += err * v;
                }
                grad_b += err;
            }
            for (w, g) in model.weights.iter_mut().zip(&grad_w) {
                *w -= LEARNING_RATE * (g + *w / C) / n;
            }
            model.intercept -= LEARNING_RATE * grad_b / n;
        }

        Ok(model)
    }

    fn decision(&self, row: &[f64]) -> f64 {
        self.intercept + self.weights.iter().zip(row).map(|(w, v)| w * v).sum::<f64>()
    }

    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(self.decision(row))
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        let [negative, positive] = self.classes;
        x.iter()
            .map(|row| {
                if self.decision(row) > 0.0 {
                    positive
                } else {
                    negative
                }
            })
            .collect()
    }
}
