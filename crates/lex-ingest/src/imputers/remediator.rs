//! Severity-driven missing-data remediation.

use super::statistical::{NO_STATISTIC_REASON, StatisticalImputer};
use crate::config::{DegenerateColumnPolicy, PipelineConfig};
use crate::error::{IngestError, Result};
use crate::types::{FillValue, MissingSeverity, RemediationAction, RemediationSummary};
use crate::utils::missing_count;
use polars::prelude::*;
use tracing::{debug, info, warn};

/// What to do with one column, decided before the table is touched.
enum ColumnPlan {
    Unchanged,
    FillNumeric(f64, FillValue),
    FillText(String, FillValue),
    Skip,
}

/// Applies the drop-column or impute policy to named columns.
#[derive(Debug, Clone)]
pub struct MissingDataRemediator {
    degenerate_policy: DegenerateColumnPolicy,
    numeric_sentinel: f64,
    text_sentinel: String,
}

impl Default for MissingDataRemediator {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl MissingDataRemediator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            degenerate_policy: config.degenerate_policy,
            numeric_sentinel: config.numeric_sentinel,
            text_sentinel: config.text_sentinel.clone(),
        }
    }

    /// Remediate `columns` of `df` according to `severity`.
    ///
    /// `High` drops the columns. `Moderate` and `Default` fill nulls with
    /// the column median (numeric) or mode (text). Every column name is
    /// checked and every fill value computed before the table is changed,
    /// so an error leaves `df` as it was.
    pub fn remediate(
        &self,
        df: &mut DataFrame,
        severity: MissingSeverity,
        columns: &[impl AsRef<str>],
    ) -> Result<RemediationSummary> {
        let columns = Self::unique_columns(columns);
        for col_name in &columns {
            if df.column(col_name).is_err() {
                return Err(IngestError::ColumnNotFound(col_name.clone()));
            }
        }

        info!(
            "Remediating {} columns with severity '{}'",
            columns.len(),
            severity
        );

        let actions = if severity.drops_columns() {
            Self::drop_columns(df, columns)?
        } else {
            self.impute_columns(df, columns)?
        };

        Ok(RemediationSummary { severity, actions })
    }

    fn unique_columns(columns: &[impl AsRef<str>]) -> Vec<String> {
        let mut unique: Vec<String> = Vec::with_capacity(columns.len());
        for col in columns {
            let col = col.as_ref();
            if !unique.iter().any(|c| c == col) {
                unique.push(col.to_string());
            }
        }
        unique
    }

    fn drop_columns(df: &mut DataFrame, columns: Vec<String>) -> Result<Vec<RemediationAction>> {
        let mut actions = Vec::with_capacity(columns.len());
        for column in columns {
            df.drop_in_place(&column)?;
            debug!("Dropped column '{}'", column);
            actions.push(RemediationAction::DroppedColumn { column });
        }
        Ok(actions)
    }

    fn impute_columns(
        &self,
        df: &mut DataFrame,
        columns: Vec<String>,
    ) -> Result<Vec<RemediationAction>> {
        let plans = columns
            .into_iter()
            .map(|column| {
                let plan = self.plan_column(df, &column)?;
                Ok((column, plan))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut actions = Vec::with_capacity(plans.len());
        for (column, plan) in plans {
            let original_dtype = df.column(&column)?.dtype().clone();
            let (filled, fill) = match plan {
                ColumnPlan::Unchanged => {
                    actions.push(RemediationAction::Unchanged { column });
                    continue;
                }
                ColumnPlan::Skip => {
                    actions.push(RemediationAction::Skipped {
                        column,
                        reason: NO_STATISTIC_REASON.to_string(),
                    });
                    continue;
                }
                ColumnPlan::FillNumeric(value, fill) => {
                    (StatisticalImputer::fill_numeric(df, &column, value)?, fill)
                }
                ColumnPlan::FillText(value, fill) => {
                    (StatisticalImputer::fill_text(df, &column, &value)?, fill)
                }
            };

            let new_dtype = df.column(&column)?.dtype();
            let converted_to = (*new_dtype != original_dtype).then(|| {
                warn!(
                    "Column '{}' converted from {} to {} while filling",
                    column, original_dtype, new_dtype
                );
                new_dtype.to_string()
            });
            actions.push(RemediationAction::Imputed {
                column,
                filled,
                fill,
                converted_to,
            });
        }
        Ok(actions)
    }

    fn plan_column(&self, df: &DataFrame, column: &str) -> Result<ColumnPlan> {
        let col = df
            .column(column)
            .map_err(|_| IngestError::ColumnNotFound(column.to_string()))?;
        if missing_count(col.as_materialized_series())? == 0 {
            return Ok(ColumnPlan::Unchanged);
        }

        let numeric = StatisticalImputer::is_numeric(df, column)?;
        let statistic = if numeric {
            StatisticalImputer::median(df, column)?
                .map(|value| ColumnPlan::FillNumeric(value, FillValue::Median { value }))
        } else {
            StatisticalImputer::mode(df, column)?.map(|value| {
                let fill = FillValue::Mode {
                    value: value.clone(),
                };
                ColumnPlan::FillText(value, fill)
            })
        };

        if let Some(plan) = statistic {
            return Ok(plan);
        }

        warn!("Column '{}' is entirely missing: {}", column, NO_STATISTIC_REASON);
        match self.degenerate_policy {
            DegenerateColumnPolicy::Fail => Err(IngestError::NoValidValues(column.to_string())),
            DegenerateColumnPolicy::Skip => Ok(ColumnPlan::Skip),
            DegenerateColumnPolicy::Sentinel if numeric => {
                let value = self.numeric_sentinel;
                Ok(ColumnPlan::FillNumeric(
                    value,
                    FillValue::Sentinel {
                        value: value.to_string(),
                        reason: NO_STATISTIC_REASON.to_string(),
                    },
                ))
            }
            DegenerateColumnPolicy::Sentinel => {
                let value = self.text_sentinel.clone();
                Ok(ColumnPlan::FillText(
                    value.clone(),
                    FillValue::Sentinel {
                        value,
                        reason: NO_STATISTIC_REASON.to_string(),
                    },
                ))
            }
        }
    }
}

/// Remediate `columns` and hand the table back.
///
/// `severity` of `None` (or any unrecognised tier) imputes, the same as
/// `Moderate`.
pub fn remediate_missing(
    mut df: DataFrame,
    severity: impl Into<Option<MissingSeverity>>,
    columns: &[impl AsRef<str>],
) -> Result<DataFrame> {
    let severity = severity.into().unwrap_or_default();
    MissingDataRemediator::default().remediate(&mut df, severity, columns)?;
    Ok(df)
}
