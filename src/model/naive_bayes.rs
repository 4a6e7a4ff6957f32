// src/model/naive_bayes.rs

use serde::{Deserialize, Serialize};

use super::{classes_of, Classifier};
use crate::errors::Result;

/// Portion of the largest feature variance added to every variance.
const VAR_SMOOTHING: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNb {
    pub classes: Vec<f64>,
    pub log_priors: Vec<f64>,
    /// Per class, per feature.
    pub means: Vec<Vec<f64>>,
    pub variances: Vec<Vec<f64>>,
}

fn mean_var(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var)
}

impl GaussianNb {
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        let n_features = x.first().map(Vec::len).unwrap_or(0);
        let classes = classes_of(y);

        let epsilon = VAR_SMOOTHING
            * (0..n_features)
                .map(|j| {
                    let column: Vec<f64> = x.iter().map(|r| r[j]).collect();
                    mean_var(&column).1
                })
                .fold(0.0_f64, f64::max);

        let mut log_priors = Vec::with_capacity(classes.len());
        let mut means = Vec::with_capacity(classes.len());
        let mut variances = Vec::with_capacity(classes.len());

        for class in &classes {
            let rows: Vec<&Vec<f64>> = x
                .iter()
                .zip(y)
                .filter(|(_, label)| *label == class)
                .map(|(r, _)| r)
                .collect();
            log_priors.push((rows.len() as f64 / y.len() as f64).ln());

            let (mu, var): (Vec<f64>, Vec<f64>) = (0..n_features)
                .map(|j| {
                    let column: Vec<f64> = rows.iter().map(|r| r[j]).collect();
                    let (m, v) = mean_var(&column);
                    (m, v + epsilon)
                })
                .unzip();
            means.push(mu);
            variances.push(var);
        }

        Ok(Self {
            classes,
            log_priors,
            means,
            variances,
        })
    }

    fn joint_log_likelihood(&self, row: &[f64], k: usize) -> f64 {
        let mut total = self.log_priors[k];
        for ((v, mu), var) in row.iter().zip(&self.means[k]).zip(&self.variances[k]) {
            if *var > 0.0 {
                total -= 0.5 * (2.0 * std::f64::consts::PI * var).ln();
                total -= (v - mu).powi(2) / (2.0 * var);
            } else if v != mu {
                return f64::NEG_INFINITY;
            }
        }
        total
    }
}

impl Classifier for GaussianNb {
    fn n_features(&self) -> usize {
        self.means.first().map(Vec::len).unwrap_or(0)
    }

    fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter()
            .map(|row| {
                let best = (0..self.classes.len())
                    .map(|k| (k, self.joint_log_likelihood(row, k)))
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(k, _)| k)
                    .unwrap_or(0);
                self.classes.get(best).copied().unwrap_or(f64::NAN)
            })
            .collect()
    }
}
