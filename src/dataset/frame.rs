// src/dataset/frame.rs

//! Column-level helpers over `polars` frames.
//!
//! All pipeline frames are numeric; values are handled as `f64` with nulls
//! preserved as `None` until imputation.

use polars::prelude::*;

use crate::errors::Result;

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_index(name).is_some()
}

/// Values of `name` as `f64`, nulls kept.
pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df.column(name)?.as_materialized_series();
    let floats = series.cast(&DataType::Float64)?;
    Ok(floats.f64()?.into_iter().collect())
}

/// Values of `name` as `f64`, nulls read as NaN.
pub fn dense_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(float_values(df, name)?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Overwrite an existing column with new values of the same length.
pub fn replace_column(df: &mut DataFrame, name: &str, values: Vec<Option<f64>>) -> Result<()> {
    let series = Series::new(name.into(), values);
    df.replace(name, series)?;
    Ok(())
}

/// Cast every column to `Float64`, keeping order and nulls.
pub fn cast_all_float(df: &DataFrame) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        let series = column.as_materialized_series().cast(&DataType::Float64)?;
        columns.push(series.into_column());
    }
    Ok(DataFrame::new(columns)?)
}

/// Keep the rows whose entry in `keep` is true.
pub fn filter_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("mask".into(), keep);
    Ok(df.filter(&mask)?)
}

/// Drop each named column that is present; absent names are ignored.
///
/// Returns the frame and the names that were actually removed.
pub fn drop_columns(df: DataFrame, names: &[String]) -> Result<(DataFrame, Vec<String>)> {
    let mut df = df;
    let mut dropped = Vec::new();
    for name in names {
        if has_column(&df, name) {
            df = df.drop(name)?;
            dropped.push(name.clone());
        }
    }
    Ok((df, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            "a" => [Some(1i64), None, Some(3)],
            "b" => [0.5f64, 1.5, 2.5],
        )
        .unwrap()
    }

    #[test]
    fn cast_keeps_nulls() {
        let df = cast_all_float(&frame()).unwrap();
        assert_eq!(float_values(&df, "a").unwrap(), vec![Some(1.0), None, Some(3.0)]);
        assert!(dense_values(&df, "a").unwrap()[1].is_nan());
    }

    #[test]
    fn drop_ignores_absent_columns() {
        let (df, dropped) =
            drop_columns(frame(), &["b".to_string(), "zzz".to_string()]).unwrap();
        assert_eq!(dropped, vec!["b".to_string()]);
        assert_eq!(column_names(&df), vec!["a".to_string()]);
    }

    #[test]
    fn filter_and_replace() {
        let mut df = filter_rows(&frame(), &[true, false, true]).unwrap();
        assert_eq!(df.height(), 2);
        replace_column(&mut df, "b", vec![Some(9.0), Some(8.0)]).unwrap();
        assert_eq!(dense_values(&df, "b").unwrap(), vec![9.0, 8.0]);
    }
}
