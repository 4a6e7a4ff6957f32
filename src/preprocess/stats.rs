// src/preprocess/stats.rs

//! Numeric kernels behind preprocessing.
//!
//! Inputs are plain column vectors; NaN marks a missing value and is skipped
//! wherever a statistic is fitted. Degenerate inputs (empty columns, zero
//! variance, a single class) produce NaN or a neutral result rather than an
//! error.

use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Pivots below this magnitude are treated as zero in the normal equations.
const PIVOT_EPS: f64 = 1e-12;

fn finite_sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile with linear interpolation between closest ranks.
///
/// `None` if no non-NaN value is present.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let sorted = finite_sorted(values);
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Inclusive `[Q1 - k*IQR, Q3 + k*IQR]` fence.
pub fn iqr_bounds(values: &[f64], k: f64) -> Option<(f64, f64)> {
    let q1 = quantile(values, 0.25)?;
    let q3 = quantile(values, 0.75)?;
    let cutoff = (q3 - q1) * k;
    Some((q1 - cutoff, q3 + cutoff))
}

/// Min-max scale to `[0, 1]`, fitted on `values` itself.
///
/// A constant column maps to 0; NaN stays NaN.
pub fn min_max_scale(values: &[f64]) -> Vec<f64> {
    let sorted = finite_sorted(values);
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return values.to_vec();
    };
    let range = if max - min == 0.0 { 1.0 } else { max - min };
    values.iter().map(|v| (v - min) / range).collect()
}

/// Chi-square test of each non-negative feature column against `labels`.
///
/// Observed counts are per-class sums of the feature; expected counts are
/// `class_frequency * feature_total`. Returns one p-value per column, NaN
/// when the statistic is undefined (fewer than two classes, all-zero column).
pub fn chi2_p_values(columns: &[Vec<f64>], labels: &[f64]) -> Vec<f64> {
    let mut classes: Vec<f64> = finite_sorted(labels);
    classes.dedup();
    let n = labels.len() as f64;

    if classes.len() < 2 {
        return vec![f64::NAN; columns.len()];
    }

    let class_of = |y: f64| classes.iter().position(|c| *c == y);
    let class_prob: Vec<f64> = classes
        .iter()
        .map(|c| labels.iter().filter(|y| *y == c).count() as f64 / n)
        .collect();

    let Ok(dist) = ChiSquared::new((classes.len() - 1) as f64) else {
        return vec![f64::NAN; columns.len()];
    };

    columns
        .iter()
        .map(|column| {
            let mut observed = vec![0.0; classes.len()];
            for (value, y) in column.iter().zip(labels) {
                if let Some(k) = class_of(*y) {
                    observed[k] += value;
                }
            }
            let total: f64 = column.iter().sum();

            let stat: f64 = observed
                .iter()
                .zip(&class_prob)
                .map(|(obs, p)| {
                    let expected = p * total;
                    (obs - expected).powi(2) / expected
                })
                .sum();

            if stat.is_nan() {
                f64::NAN
            } else {
                dist.sf(stat)
            }
        })
        .collect()
}

/// Variance inflation factor of every column against the others.
///
/// Regresses column `i` on the remaining columns without an intercept and
/// returns `sum(x_i^2) / SSR_i`, i.e. `1 / (1 - R^2)` with uncentered R².
/// A perfect fit gives infinity; an all-zero column gives NaN.
pub fn variance_inflation_factors(columns: &[Vec<f64>]) -> Vec<f64> {
    (0..columns.len())
        .map(|i| {
            let target = &columns[i];
            let others: Vec<&Vec<f64>> = columns
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, c)| c)
                .collect();

            let beta = least_squares(&others, target);
            let ssr: f64 = (0..target.len())
                .map(|row| {
                    let fitted: f64 = others.iter().zip(&beta).map(|(c, b)| c[row] * b).sum();
                    (target[row] - fitted).powi(2)
                })
                .sum();
            let tss: f64 = target.iter().map(|v| v * v).sum();

            if ssr == 0.0 {
                if tss == 0.0 { f64::NAN } else { f64::INFINITY }
            } else {
                tss / ssr
            }
        })
        .collect()
}

/// Solve `min |X b - y|` through the normal equations.
///
/// Gaussian elimination with partial pivoting; a column whose pivot
/// vanishes (collinear with earlier ones) gets a zero coefficient.
fn least_squares(xs: &[&Vec<f64>], y: &[f64]) -> Vec<f64> {
    let m = xs.len();
    if m == 0 {
        return Vec::new();
    }

    let dot = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(p, q)| p * q).sum::<f64>();

    // Augmented [X'X | X'y].
    let mut a: Vec<Vec<f64>> = (0..m)
        .map(|r| {
            let mut row: Vec<f64> = (0..m).map(|c| dot(xs[r], xs[c])).collect();
            row.push(dot(xs[r], y));
            row
        })
        .collect();

    let scale = (0..m).map(|d| a[d][d].abs()).fold(0.0_f64, f64::max).max(1.0);
    let mut pivot_cols: Vec<Option<usize>> = vec![None; m];
    let mut row = 0;

    for col in 0..m {
        if row == m {
            break;
        }
        let best = (row..m)
            .max_by(|&p, &q| a[p][col].abs().total_cmp(&a[q][col].abs()))
            .unwrap_or(row);
        if a[best][col].abs() <= PIVOT_EPS * scale {
            continue;
        }
        a.swap(row, best);

        let pivot = a[row][col];
        for k in col..=m {
            a[row][k] /= pivot;
        }
        for r in 0..m {
            if r != row {
                let factor = a[r][col];
                if factor != 0.0 {
                    for k in col..=m {
                        a[r][k] -= factor * a[row][k];
                    }
                }
            }
        }
        pivot_cols[row] = Some(col);
        row += 1;
    }

    let mut beta = vec![0.0; m];
    for (r, col) in pivot_cols.iter().enumerate() {
        if let Some(c) = col {
            beta[*c] = a[r][m];
        }
    }
    beta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!(close(quantile(&v, 0.25).unwrap(), 1.75));
        assert!(close(median(&v).unwrap(), 2.5));
        assert!(close(quantile(&v, 0.75).unwrap(), 3.25));
        assert!(close(median(&[f64::NAN, 5.0, 1.0]).unwrap(), 3.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn iqr_fence_catches_single_outlier() {
        let v = [10.0, 11.0, 12.0, 13.0, 14.0, 100.0];
        let (lo, hi) = iqr_bounds(&v, 1.5).unwrap();
        assert!(lo < 10.0);
        assert!(hi < 100.0 && hi > 14.0);
    }

    #[test]
    fn min_max_handles_constant_and_empty() {
        assert_eq!(min_max_scale(&[2.0, 4.0, 6.0]), vec![0.0, 0.5, 1.0]);
        assert_eq!(min_max_scale(&[3.0, 3.0]), vec![0.0, 0.0]);
        assert!(min_max_scale(&[]).is_empty());
    }

    #[test]
    fn chi2_separates_dependent_from_independent() {
        // Feature follows the label exactly vs. constant across classes.
        let labels: Vec<f64> = (0..40).map(|i| (i % 2) as f64).collect();
        let dependent: Vec<f64> = labels.iter().map(|y| y * 3.0).collect();
        let independent = vec![1.0; 40];

        let p = chi2_p_values(&[dependent, independent], &labels);
        assert!(p[0] < 0.05, "{p:?}");
        assert!(p[1] > 0.05, "{p:?}");
    }

    #[test]
    fn chi2_single_class_is_undefined() {
        let p = chi2_p_values(&[vec![1.0, 2.0]], &[1.0, 1.0]);
        assert!(p[0].is_nan());
    }

    #[test]
    fn vif_flags_collinear_columns() {
        let a: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let b: Vec<f64> = a.iter().map(|v| 2.0 * v + 0.01 * (v % 3.0)).collect();
        let c: Vec<f64> = (0..20).map(|i| ((i * 7) % 5) as f64).collect();

        let vif = variance_inflation_factors(&[a, b, c]);
        assert!(vif[0] > 5.0 && vif[1] > 5.0, "{vif:?}");
        assert!(vif[2] < 5.0, "{vif:?}");
    }

    #[test]
    fn vif_of_lone_column_is_one() {
        let vif = variance_inflation_factors(&[vec![1.0, 2.0, 3.0]]);
        assert!(close(vif[0], 1.0));
    }

    #[test]
    fn vif_perfect_fit_is_infinite() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![2.0, 4.0, 6.0];
        let vif = variance_inflation_factors(&[a, b]);
        assert!(vif[0].is_infinite() && vif[1].is_infinite());
    }
}
