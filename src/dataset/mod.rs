// src/dataset/mod.rs

//! Tabular data moving through targets.
//!
//! - [`frame`] has column helpers used by preprocessing.
//! - [`split`] implements the stratified train/test split.
//!
//! Frames are read with every column cast to `Float64`; the CSV layout on
//! disk is whatever `polars` writes for such a frame.

pub mod frame;
pub mod split;

use std::io::Cursor;

use polars::prelude::*;
use tracing::debug;

use crate::errors::Result;
use crate::target::{Target, TargetExt};

pub use split::stratified_split;

/// Parse a CSV target into an all-`Float64` frame.
pub fn read_csv(target: &dyn Target) -> Result<DataFrame> {
    let bytes = target.read_bytes()?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    let df = frame::cast_all_float(&df)?;
    debug!(path = %target.path(), rows = df.height(), cols = df.width(), "read csv target");
    Ok(df)
}

/// Serialise `df` as CSV (with header) and commit it to `target`.
pub fn write_csv(target: &dyn Target, df: &mut DataFrame) -> Result<()> {
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf).include_header(true).finish(df)?;
    target.write_bytes(&buf)?;
    debug!(path = %target.path(), rows = df.height(), cols = df.width(), "wrote csv target");
    Ok(())
}

/// Row-major feature matrix plus label vector, as handed to a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledData {
    pub feature_names: Vec<String>,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
}

impl LabeledData {
    /// Split `df` into every non-label column (in frame order) and `label`.
    ///
    /// Null features read as NaN; a null label is an error.
    pub fn from_frame(df: &DataFrame, label: &str) -> Result<Self> {
        let y = frame::float_values(df, label)?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| {
                    PolarsError::ComputeError(
                        format!("label column '{label}' is null at row {row}").into(),
                    )
                })
            })
            .collect::<std::result::Result<Vec<f64>, PolarsError>>()?;

        let feature_names: Vec<String> = frame::column_names(df)
            .into_iter()
            .filter(|name| name != label)
            .collect();

        let mut x = vec![Vec::with_capacity(feature_names.len()); df.height()];
        for name in &feature_names {
            for (row, value) in frame::dense_values(df, name)?.into_iter().enumerate() {
                x[row].push(value);
            }
        }

        Ok(Self {
            feature_names,
            x,
            y,
        })
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}
