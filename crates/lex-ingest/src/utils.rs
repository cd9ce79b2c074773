//! Shared utilities for the ingestion pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use polars::prelude::*;
use std::collections::BTreeMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Present (non-null, non-NaN) values of a numeric Series as `f64`.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<f64>> {
    let float_series = series.cast(&DataType::Float64)?;
    let values = float_series
        .f64()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect();
    Ok(values)
}

/// Number of missing values in a Series.
///
/// Nulls are missing in every column; float columns also count `NaN`.
pub fn missing_count(series: &Series) -> PolarsResult<usize> {
    let nan_count = match series.dtype() {
        DataType::Float32 | DataType::Float64 => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .filter(|v| v.is_some_and(f64::is_nan))
            .count(),
        _ => 0,
    };
    Ok(series.null_count() + nan_count)
}

/// Median of the present values of a numeric Series.
pub fn numeric_median(series: &Series) -> PolarsResult<Option<f64>> {
    let mut values = numeric_values(series)?;
    if values.is_empty() {
        return Ok(None);
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };
    Ok(Some(median))
}

/// Nearest-rank quantile of already sorted values.
///
/// Picks the order statistic at `round(p * (n - 1))`, so the result is
/// always one of the input values.
pub fn nearest_rank_quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = (p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted.get(position).copied()
}

/// Calculate the mode (most frequent value) of a Series as text.
///
/// Ties go to the smallest value in lexical order.
pub fn string_mode(series: &Series) -> PolarsResult<Option<String>> {
    let str_series = series.cast(&DataType::String)?;
    let mut value_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for val in str_series.str()?.into_iter().flatten() {
        *value_counts.entry(val).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (val, count) in value_counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((val, count));
        }
    }
    Ok(best.map(|(val, _)| val.to_string()))
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null and `NaN` values in a numeric Series with a specific value.
///
/// The result is always `Float64`.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let float_series = series.cast(&DataType::Float64)?;
    let filled: Float64Chunked = float_series
        .f64()?
        .into_iter()
        .map(|v| Some(v.filter(|val| !val.is_nan()).unwrap_or(fill_value)))
        .collect();
    Ok(filled.with_name(series.name().clone()).into_series())
}

/// Fill null values in a Series with a specific text value.
///
/// The column keeps its dtype whenever the fill value can be expressed in
/// it: booleans are filled natively and other non-string columns are cast
/// back after filling. When that is not possible (e.g. `"Unknown"` in a
/// boolean column) the result is a `String` column.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let name = series.name().clone();
    if let (DataType::Boolean, Ok(flag)) = (series.dtype(), fill_value.parse::<bool>()) {
        let filled: BooleanChunked = series
            .bool()?
            .into_iter()
            .map(|v| Some(v.unwrap_or(flag)))
            .collect();
        return Ok(filled.with_name(name).into_series());
    }

    let str_series = series.cast(&DataType::String)?;
    let filled: StringChunked = str_series
        .str()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value)))
        .collect();
    let filled = filled.with_name(name).into_series();

    match series.dtype() {
        DataType::String | DataType::Boolean => Ok(filled),
        dtype => Ok(filled.strict_cast(dtype).unwrap_or(filled)),
    }
}

// =============================================================================
// Tests
// =============================================================================
