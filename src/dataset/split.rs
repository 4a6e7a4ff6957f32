// src/dataset/split.rs

use std::collections::BTreeMap;

use polars::prelude::*;
use rand::prelude::*;
use tracing::debug;

use super::frame;
use crate::errors::{PipelineError, Result};

/// Single stratified shuffle split on `label`.
///
/// Rows are grouped by label value; each group is shuffled with a seeded
/// RNG and `round(group_len * test_size)` of its rows go to the test half.
/// Both halves keep the original row order. Returns `(train, test)`.
pub fn stratified_split(
    df: &DataFrame,
    label: &str,
    test_size: f64,
    seed: u64,
) -> Result<(DataFrame, DataFrame)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::ConfigError(format!(
            "test_size must lie strictly between 0 and 1 (got {test_size})"
        )));
    }

    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (row, value) in frame::float_values(df, label)?.into_iter().enumerate() {
        let class = value.ok_or_else(|| {
            PipelineError::ConfigError(format!("label '{label}' is null at row {row}"))
        })?;
        groups.entry(class.round() as i64).or_default().push(row);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut is_test = vec![false; df.height()];
    for rows in groups.values_mut() {
        rows.shuffle(&mut rng);
        let n_test = (rows.len() as f64 * test_size).round() as usize;
        for &row in rows.iter().take(n_test) {
            is_test[row] = true;
        }
    }

    let is_train: Vec<bool> = is_test.iter().map(|t| !t).collect();
    let train = frame::filter_rows(df, &is_train)?;
    let test = frame::filter_rows(df, &is_test)?;

    debug!(
        classes = groups.len(),
        train_rows = train.height(),
        test_rows = test.height(),
        "stratified split"
    );
    Ok((train, test))
}
