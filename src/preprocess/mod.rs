// src/preprocess/mod.rs

//! Statistical preprocessing of the heart dataset.
//!
//! Two variants share the [`Preprocessor`] interface:
//!
//! - [`TrainPreprocessor`] fits everything on its own data: it removes IQR
//!   outliers, then records which categorical columns are independent of the
//!   label (chi-square) and which continuous columns are collinear (VIF).
//! - [`TestPreprocessor`] is built from the [`FeatureSelection`] a train run
//!   recorded. It never drops rows and never looks at its labels to choose
//!   columns.
//!
//! Imputation medians and min-max ranges are always fitted on the frame
//! being processed, in both phases.

pub mod schema;
pub mod stats;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::frame;
use crate::errors::Result;
use crate::types::Phase;

pub use schema::{FeatureSchema, SentinelRule};

/// Multiplier on the interquartile range for the outlier fence.
pub const IQR_FENCE: f64 = 1.5;
/// Columns whose chi-square p-value exceeds this are dropped.
pub const CHI2_P_THRESHOLD: f64 = 0.05;
/// Continuous columns whose VIF exceeds this are considered collinear.
pub const VIF_THRESHOLD: f64 = 5.0;

/// Column drop decisions made on training data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSelection {
    /// Categorical/binary columns independent of the label; all dropped.
    pub independent: Vec<String>,
    /// Collinear continuous columns in schema order; all but the last dropped.
    pub correlated: Vec<String>,
}

impl FeatureSelection {
    /// Collinear columns that are removed; the last one in order survives.
    pub fn correlated_to_drop(&self) -> &[String] {
        match self.correlated.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Output of one preprocessing pass.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub frame: DataFrame,
    /// The selection that was applied (fitted in TRAIN, given in TEST).
    pub selection: FeatureSelection,
    pub rows_removed: usize,
}

pub trait Preprocessor {
    fn phase(&self) -> Phase;

    fn preprocess(&self, df: DataFrame) -> Result<Preprocessed>;
}

/// Build the variant for `phase`; TEST requires the recorded TRAIN selection.
pub fn for_phase(
    phase: Phase,
    schema: FeatureSchema,
    train_selection: Option<FeatureSelection>,
) -> Result<Box<dyn Preprocessor + Send>> {
    match (phase, train_selection) {
        (Phase::Train, _) => Ok(Box::new(TrainPreprocessor::new(schema))),
        (Phase::Test, Some(selection)) => Ok(Box::new(TestPreprocessor::new(schema, selection))),
        (Phase::Test, None) => Err(crate::errors::PipelineError::ConfigError(
            "test preprocessing needs the feature selection recorded by a train run".to_string(),
        )),
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrainPreprocessor {
    schema: FeatureSchema,
}

impl TrainPreprocessor {
    pub fn new(schema: FeatureSchema) -> Self {
        Self { schema }
    }
}

impl Preprocessor for TrainPreprocessor {
    fn phase(&self) -> Phase {
        Phase::Train
    }

    fn preprocess(&self, df: DataFrame) -> Result<Preprocessed> {
        let schema = &self.schema;
        let rows_in = df.height();

        let mut df = frame::cast_all_float(&df)?;
        clean_sentinels(&mut df, schema)?;
        impute_medians(&mut df)?;
        let mut df = remove_outliers(&df, schema)?;
        let rows_removed = rows_in - df.height();
        scale_continuous(&mut df, schema)?;

        let independent = independent_columns(&df, schema)?;
        let (df, _) = frame::drop_columns(df, &independent)?;

        let correlated = correlated_columns(&df, schema)?;
        let selection = FeatureSelection {
            independent,
            correlated,
        };
        let (df, dropped) = frame::drop_columns(df, selection.correlated_to_drop())?;

        info!(
            phase = %Phase::Train,
            rows = df.height(),
            rows_removed,
            independent = ?selection.independent,
            correlated = ?selection.correlated,
            dropped_correlated = ?dropped,
            "preprocessed"
        );

        Ok(Preprocessed {
            frame: df,
            selection,
            rows_removed,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TestPreprocessor {
    schema: FeatureSchema,
    selection: FeatureSelection,
}

impl TestPreprocessor {
    pub fn new(schema: FeatureSchema, selection: FeatureSelection) -> Self {
        Self { schema, selection }
    }
}

impl Preprocessor for TestPreprocessor {
    fn phase(&self) -> Phase {
        Phase::Test
    }

    fn preprocess(&self, df: DataFrame) -> Result<Preprocessed> {
        let schema = &self.schema;

        let mut df = frame::cast_all_float(&df)?;
        clean_sentinels(&mut df, schema)?;
        impute_medians(&mut df)?;
        scale_continuous(&mut df, schema)?;

        let (df, dropped_independent) = frame::drop_columns(df, &self.selection.independent)?;
        let (df, dropped_correlated) =
            frame::drop_columns(df, self.selection.correlated_to_drop())?;

        info!(
            phase = %Phase::Test,
            rows = df.height(),
            dropped_independent = ?dropped_independent,
            dropped_correlated = ?dropped_correlated,
            "preprocessed"
        );

        Ok(Preprocessed {
            frame: df,
            selection: self.selection.clone(),
            rows_removed: 0,
        })
    }
}

/// Null out values of bounded columns that fall outside their valid set.
fn clean_sentinels(df: &mut DataFrame, schema: &FeatureSchema) -> Result<()> {
    for rule in &schema.sentinels {
        if !frame::has_column(df, &rule.column) {
            continue;
        }
        let mut invalid = 0usize;
        let cleaned: Vec<Option<f64>> = frame::float_values(df, &rule.column)?
            .into_iter()
            .map(|v| match v {
                Some(x) if rule.valid.contains(&x) => Some(x),
                Some(_) => {
                    invalid += 1;
                    None
                }
                None => None,
            })
            .collect();
        debug!(column = %rule.column, invalid, "sentinel cleanup");
        frame::replace_column(df, &rule.column, cleaned)?;
    }
    Ok(())
}

/// Fill nulls in every column with that column's median on this frame.
fn impute_medians(df: &mut DataFrame) -> Result<()> {
    for name in frame::column_names(df) {
        let values = frame::float_values(df, &name)?;
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing == 0 {
            continue;
        }
        let dense: Vec<f64> = values.iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        let Some(median) = stats::median(&dense) else {
            continue;
        };
        debug!(column = %name, missing, median, "median imputation");
        let filled = values.into_iter().map(|v| Some(v.unwrap_or(median))).collect();
        frame::replace_column(df, &name, filled)?;
    }
    Ok(())
}

/// Drop rows where any continuous column lies outside its IQR fence.
fn remove_outliers(df: &DataFrame, schema: &FeatureSchema) -> Result<DataFrame> {
    let mut keep = vec![true; df.height()];
    for name in schema.continuous.iter().filter(|c| frame::has_column(df, c)) {
        let values = frame::dense_values(df, name)?;
        let Some((lower, upper)) = stats::iqr_bounds(&values, IQR_FENCE) else {
            continue;
        };
        for (row, v) in values.iter().enumerate() {
            if *v < lower || *v > upper {
                keep[row] = false;
            }
        }
    }
    frame::filter_rows(df, &keep)
}

fn scale_continuous(df: &mut DataFrame, schema: &FeatureSchema) -> Result<()> {
    let present: Vec<String> = schema
        .continuous
        .iter()
        .filter(|c| frame::has_column(df, c))
        .cloned()
        .collect();
    for name in &present {
        let scaled = stats::min_max_scale(&frame::dense_values(df, name)?)
            .into_iter()
            .map(|v| (!v.is_nan()).then_some(v))
            .collect();
        frame::replace_column(df, name, scaled)?;
    }
    Ok(())
}

/// Selectable columns whose chi-square p-value exceeds the threshold.
fn independent_columns(df: &DataFrame, schema: &FeatureSchema) -> Result<Vec<String>> {
    let present: Vec<&String> = schema
        .selectable
        .iter()
        .filter(|c| frame::has_column(df, c))
        .collect();
    let columns = present
        .iter()
        .map(|c| frame::dense_values(df, c))
        .collect::<Result<Vec<_>>>()?;
    let labels = frame::dense_values(df, &schema.label)?;

    let p_values = stats::chi2_p_values(&columns, &labels);
    debug!(columns = ?present, ?p_values, "chi-square selection");

    Ok(present
        .into_iter()
        .zip(p_values)
        .filter(|(_, p)| *p > CHI2_P_THRESHOLD)
        .map(|(c, _)| c.clone())
        .collect())
}

/// Continuous columns whose VIF exceeds the threshold, in schema order.
fn correlated_columns(df: &DataFrame, schema: &FeatureSchema) -> Result<Vec<String>> {
    let present: Vec<&String> = schema
        .continuous
        .iter()
        .filter(|c| frame::has_column(df, c))
        .collect();
    let columns = present
        .iter()
        .map(|c| frame::dense_values(df, c))
        .collect::<Result<Vec<_>>>()?;

    let vif = stats::variance_inflation_factors(&columns);
    debug!(columns = ?present, ?vif, "variance inflation factors");

    Ok(present
        .into_iter()
        .zip(vif)
        .filter(|(_, v)| *v > VIF_THRESHOLD)
        .map(|(c, _)| c.clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_correlated_column_survives() {
        let selection = FeatureSelection {
            independent: vec![],
            correlated: vec!["age".into(), "trestbps".into(), "chol".into()],
        };
        assert_eq!(selection.correlated_to_drop(), ["age", "trestbps"]);
        assert!(FeatureSelection::default().correlated_to_drop().is_empty());
    }

    #[test]
    fn selection_json_round_trips() {
        let selection = FeatureSelection {
            independent: vec!["fbs".into()],
            correlated: vec![],
        };
        let bytes = selection.to_json_bytes().unwrap();
        assert_eq!(FeatureSelection::from_json_bytes(&bytes).unwrap(), selection);
    }

    #[test]
    fn scaling_skips_continuous_columns_missing_from_the_frame() {
        let mut df = polars::df!(
            "age" => [20.0, 40.0, 60.0],
            "target" => [0.0, 1.0, 0.0],
        )
        .unwrap();

        scale_continuous(&mut df, &FeatureSchema::heart()).unwrap();

        assert_eq!(frame::dense_values(&df, "age").unwrap(), vec![0.0, 0.5, 1.0]);
        assert_eq!(frame::dense_values(&df, "target").unwrap(), vec![0.0, 1.0, 0.0]);
        assert!(!frame::has_column(&df, "chol"));
    }

    #[test]
    fn test_phase_requires_recorded_selection() {
        assert!(for_phase(Phase::Test, FeatureSchema::heart(), None).is_err());
        let p = for_phase(Phase::Train, FeatureSchema::heart(), None).unwrap();
        assert_eq!(p.phase(), Phase::Train);
    }
}
