//! Statistical imputation methods.
//!
//! Provides median and mode fills plus the sentinel fallback for columns
//! with nothing to compute from.

use crate::error::{IngestError, Result, ResultExt};
use crate::utils::{
    fill_numeric_nulls, fill_string_nulls, is_numeric_dtype, missing_count, numeric_median,
    string_mode,
};
use polars::prelude::*;
use tracing::debug;

/// Reason recorded when a column has no median or mode.
pub const NO_STATISTIC_REASON: &str = "no mode/median computable";

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    fn series<'a>(df: &'a DataFrame, col_name: &str) -> Result<&'a Series> {
        df.column(col_name)
            .map(|col| col.as_materialized_series())
            .map_err(|_| IngestError::ColumnNotFound(col_name.to_string()))
    }

    /// Whether the column holds numeric values.
    pub fn is_numeric(df: &DataFrame, col_name: &str) -> Result<bool> {
        Ok(is_numeric_dtype(Self::series(df, col_name)?.dtype()))
    }

    /// Median of the column's present values, `None` if all are missing.
    pub fn median(df: &DataFrame, col_name: &str) -> Result<Option<f64>> {
        numeric_median(Self::series(df, col_name)?)
            .context(format!("Computing median of '{col_name}'"))
    }

    /// Most frequent present value as text, `None` if all are missing.
    pub fn mode(df: &DataFrame, col_name: &str) -> Result<Option<String>> {
        string_mode(Self::series(df, col_name)?).context(format!("Computing mode of '{col_name}'"))
    }

    /// Replace nulls (and float `NaN`) in a numeric column with `value`.
    /// Returns the number of values filled.
    pub fn fill_numeric(df: &mut DataFrame, col_name: &str, value: f64) -> Result<usize> {
        let series = Self::series(df, col_name)?;
        let missing = missing_count(series)?;
        if missing == 0 {
            return Ok(0);
        }
        let filled =
            fill_numeric_nulls(series, value).context(format!("Filling nulls in '{col_name}'"))?;
        df.replace(col_name, filled)?;
        debug!("Filled {} nulls in '{}' with {:.2}", missing, col_name, value);
        Ok(missing)
    }

    /// Replace nulls in a column with the text `value`. Returns the number
    /// of values filled.
    pub fn fill_text(df: &mut DataFrame, col_name: &str, value: &str) -> Result<usize> {
        let series = Self::series(df, col_name)?;
        let missing = series.null_count();
        if missing == 0 {
            return Ok(0);
        }
        let filled =
            fill_string_nulls(series, value).context(format!("Filling nulls in '{col_name}'"))?;
        df.replace(col_name, filled)?;
        debug!("Filled {} nulls in '{}' with '{}'", missing, col_name, value);
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // median() / mode() tests
    // ========================================================================

    #[test]
    fn test_median_ignores_nulls() {
        let df = df![
            "values" => [Some(1.0), None, Some(3.0), None, Some(5.0)],
        ]
        .unwrap();
        assert_eq!(StatisticalImputer::median(&df, "values").unwrap(), Some(3.0));
    }

    #[test]
    fn test_median_all_nulls() {
        let df = df![
            "values" => [Option::<f64>::None, None, None],
        ]
        .unwrap();
        assert_eq!(StatisticalImputer::median(&df, "values").unwrap(), None);
    }

    #[test]
    fn test_mode_basic() {
        let df = df![
            "category" => [Some("A"), Some("B"), Some("A"), None, Some("A")],
        ]
        .unwrap();
        assert_eq!(
            StatisticalImputer::mode(&df, "category").unwrap(),
            Some("A".to_string())
        );
    }

    #[test]
    fn test_median_failure_carries_context() {
        let inner = Series::new("".into(), &[1i32, 2]);
        let df = DataFrame::new(vec![
            Series::new("nested".into(), &[inner.clone(), inner]).into(),
        ])
        .unwrap();

        let err = StatisticalImputer::median(&df, "nested").unwrap_err();

        assert!(matches!(err, IngestError::WithContext { .. }));
        assert_eq!(err.error_code(), "POLARS_ERROR");
        assert!(err.to_string().starts_with("Computing median of 'nested'"));
    }

    #[test]
    fn test_fill_numeric_replaces_nan() {
        let mut df = df!["values" => [Some(1.0), Some(f64::NAN), None, Some(3.0)]].unwrap();

        let filled = StatisticalImputer::fill_numeric(&mut df, "values", 2.0).unwrap();

        assert_eq!(filled, 2);
        let values: Vec<Option<f64>> = df
            .column("values")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_nonexistent_column() {
        let df = df!["other" => [1.0, 2.0, 3.0]].unwrap();
        assert!(matches!(
            StatisticalImputer::median(&df, "values"),
            Err(IngestError::ColumnNotFound(_))
        ));
    }

    // ========================================================================
    // fill_numeric() / fill_text() tests
    // ========================================================================

    #[test]
    fn test_fill_numeric_basic() {
        let mut df = df![
            "values" => [Some(1.0), None, Some(3.0), None, Some(5.0)],
        ]
        .unwrap();

        let filled = StatisticalImputer::fill_numeric(&mut df, "values", 3.0).unwrap();

        assert_eq!(filled, 2);
        let values = df.column("values").unwrap();
        assert_eq!(values.null_count(), 0);
        assert_eq!(values.get(1).unwrap().try_extract::<f64>().unwrap(), 3.0);
        assert_eq!(values.get(4).unwrap().try_extract::<f64>().unwrap(), 5.0);
    }

    #[test]
    fn test_fill_numeric_no_nulls_keeps_dtype() {
        let mut df = df!["values" => [1i64, 2, 3]].unwrap();

        let filled = StatisticalImputer::fill_numeric(&mut df, "values", 0.0).unwrap();

        assert_eq!(filled, 0);
        assert_eq!(df.column("values").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_fill_numeric_integer_column_becomes_float() {
        let mut df = df!["values" => [Some(1i64), None, Some(4)]].unwrap();

        StatisticalImputer::fill_numeric(&mut df, "values", 2.5).unwrap();

        let values = df.column("values").unwrap();
        assert!(matches!(values.dtype(), DataType::Float64));
        assert_eq!(values.get(1).unwrap().try_extract::<f64>().unwrap(), 2.5);
    }

    #[test]
    fn test_fill_text_basic() {
        let mut df = df![
            "category" => [Some("A"), None, Some("B")],
        ]
        .unwrap();

        let filled = StatisticalImputer::fill_text(&mut df, "category", "Missing").unwrap();

        assert_eq!(filled, 1);
        let category = df.column("category").unwrap();
        assert_eq!(category.null_count(), 0);
        let values: Vec<Option<&str>> = category.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("A"), Some("Missing"), Some("B")]);
    }
}
