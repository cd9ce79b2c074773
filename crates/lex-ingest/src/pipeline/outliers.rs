//! Outlier handling module.
//!
//! Caps numeric columns at their IQR bounds.

use crate::config::PipelineConfig;
use crate::error::{IngestError, Result};
use crate::types::{CapSummary, ColumnCapResult, IqrBounds};
use crate::utils::{is_numeric_dtype, nearest_rank_quantile, numeric_values};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Caps outliers in numeric columns at `Q1 - k*IQR` and `Q3 + k*IQR`.
///
/// Quartiles are nearest-rank order statistics of the present values, so
/// Q1 and Q3 always sit inside the bounds and are never moved by capping.
/// Running the capper again therefore finds the same bounds and changes
/// nothing.
#[derive(Debug, Clone)]
pub struct OutlierCapper {
    multiplier: f64,
}

impl Default for OutlierCapper {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl OutlierCapper {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            multiplier: config.iqr_multiplier,
        }
    }

    /// IQR bounds of a numeric Series, `None` if it has no present values.
    pub fn bounds(&self, series: &Series) -> Result<Option<IqrBounds>> {
        let mut values = numeric_values(series)?;
        values.sort_by(f64::total_cmp);

        let bounds = nearest_rank_quantile(&values, 0.25)
            .zip(nearest_rank_quantile(&values, 0.75))
            .map(|(q1, q3)| IqrBounds::from_quartiles(q1, q3, self.multiplier));
        Ok(bounds)
    }

    /// Cap every named column in place.
    ///
    /// All columns are checked before any is modified.
    pub fn cap(&self, df: &mut DataFrame, columns: &[impl AsRef<str>]) -> Result<CapSummary> {
        for name in columns {
            let name = name.as_ref();
            let col = df
                .column(name)
                .map_err(|_| IngestError::ColumnNotFound(name.to_string()))?;
            if !is_numeric_dtype(col.dtype()) {
                return Err(IngestError::InvalidColumnType {
                    column: name.to_string(),
                    expected: "numeric".to_string(),
                    actual: col.dtype().to_string(),
                });
            }
        }

        let mut summary = CapSummary::default();
        for name in columns {
            let name = name.as_ref();
            if summary.get(name).is_some() {
                continue;
            }
            summary.columns.push(self.cap_column(df, name)?);
        }

        info!(
            "Capped {} values across {} columns",
            summary.total_capped(),
            summary.columns.len()
        );
        Ok(summary)
    }

    fn cap_column(&self, df: &mut DataFrame, name: &str) -> Result<ColumnCapResult> {
        let series = df.column(name)?.as_materialized_series();

        let Some(bounds) = self.bounds(series)? else {
            warn!("Column '{}' has no present values, skipping outlier capping", name);
            return Ok(ColumnCapResult {
                column: name.to_string(),
                bounds: None,
                capped_low: 0,
                capped_high: 0,
            });
        };

        let float_series = series.cast(&DataType::Float64)?;
        let f64_series = float_series.f64()?;
        let capped_low = f64_series
            .into_iter()
            .filter(|v| v.is_some_and(|val| val < bounds.lower))
            .count();
        let capped_high = f64_series
            .into_iter()
            .filter(|v| v.is_some_and(|val| val > bounds.upper))
            .count();

        debug!(
            "'{}': Q1={:.4} Q3={:.4} bounds=[{:.4}, {:.4}]",
            name, bounds.q1, bounds.q3, bounds.lower, bounds.upper
        );

        if capped_low + capped_high > 0 {
            let capped = f64_series
                .apply(|v| v.map(|val| bounds.clamp(val)))
                .with_name(name.into());
            df.replace(name, capped.into_series())?;
            debug!(
                "Capped {} low and {} high outliers in '{}'",
                capped_low, capped_high, name
            );
        }

        Ok(ColumnCapResult {
            column: name.to_string(),
            bounds: Some(bounds),
            capped_low,
            capped_high,
        })
    }
}

/// Cap outliers in `columns` and hand the table back.
pub fn cap_outliers(mut df: DataFrame, columns: &[impl AsRef<str>]) -> Result<DataFrame> {
    OutlierCapper::default().cap(&mut df, columns)?;
    Ok(df)
}
