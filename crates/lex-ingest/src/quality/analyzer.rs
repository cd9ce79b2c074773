use crate::types::{MissingColumnSummary, MissingDataReport};
use crate::utils::missing_count;
use polars::prelude::*;
use tracing::debug;

pub struct MissingDataAnalyzer;

impl MissingDataAnalyzer {
    /// Count missing values per column: nulls, plus `NaN` in float columns.
    ///
    /// Only columns with at least one missing value are reported, sorted by count
    /// descending; ties keep the table's column order. Percentages use the
    /// current row count. The table is not modified.
    pub fn summarize(df: &DataFrame) -> MissingDataReport {
        let total_rows = df.height();

        let mut columns: Vec<MissingColumnSummary> = df
            .get_columns()
            .iter()
            .filter_map(|col| {
                let missing_count = missing_count(col.as_materialized_series())
                    .unwrap_or_else(|_| col.null_count());
                (missing_count > 0).then(|| MissingColumnSummary {
                    column: col.name().to_string(),
                    missing_count,
                    missing_percentage: missing_count as f64 / total_rows as f64 * 100.0,
                })
            })
            .collect();

        // stable sort keeps column order among equal counts
        columns.sort_by(|a, b| b.missing_count.cmp(&a.missing_count));

        debug!(
            "{} of {} columns have missing values",
            columns.len(),
            df.width()
        );

        MissingDataReport {
            total_rows,
            columns,
        }
    }
}

/// Per-column missing counts and percentages, ranked descending.
pub fn missing_data_summary(df: &DataFrame) -> MissingDataReport {
    MissingDataAnalyzer::summarize(df)
}
