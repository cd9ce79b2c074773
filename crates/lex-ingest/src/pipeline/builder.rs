//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating extraction, loading, missing-data remediation and
//! outlier capping.

use crate::config::PipelineConfig;
use crate::error::{IngestError, Result};
use crate::imputers::MissingDataRemediator;
use crate::loader::extract_and_load;
use crate::pipeline::OutlierCapper;
use crate::quality::MissingDataAnalyzer;
use crate::types::{
    CapSummary, ExtractionSummary, MissingSeverity, PipelineReport, PipelineResult,
    RemediationSummary,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{error, info};

/// Which columns get which treatment.
///
/// Tiers are applied in the order `high`, `moderate`, `default`, then
/// `cap_columns` are capped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningPlan {
    /// Columns to drop.
    pub high: Vec<String>,
    /// Columns to impute.
    pub moderate: Vec<String>,
    /// Columns given without a tier; imputed like `moderate`.
    pub default: Vec<String>,
    /// Numeric columns to cap at their IQR bounds.
    pub cap_columns: Vec<String>,
}

impl CleaningPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add columns under a severity tier.
    pub fn with_tier(
        mut self,
        severity: MissingSeverity,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let target = match severity {
            MissingSeverity::High => &mut self.high,
            MissingSeverity::Moderate => &mut self.moderate,
            MissingSeverity::Default => &mut self.default,
        };
        target.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Add columns to cap.
    pub fn with_cap_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cap_columns.extend(columns.into_iter().map(Into::into));
        self
    }

    fn tiers(&self) -> [(MissingSeverity, &[String]); 3] {
        [
            (MissingSeverity::High, self.high.as_slice()),
            (MissingSeverity::Moderate, self.moderate.as_slice()),
            (MissingSeverity::Default, self.default.as_slice()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.tiers().iter().all(|(_, cols)| cols.is_empty()) && self.cap_columns.is_empty()
    }
}

/// The ingestion and cleaning pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use lex_ingest::{CleaningPlan, MissingSeverity, Pipeline, PipelineConfig};
///
/// let plan = CleaningPlan::new()
///     .with_tier(MissingSeverity::High, ["NumberOfVehiclesInFleet"])
///     .with_tier(MissingSeverity::Moderate, ["Gender", "Bank"])
///     .with_cap_columns(["TotalPremium", "TotalClaims"]);
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().destination_directory("data").build()?)
///     .plan(plan)
///     .build()?
///     .run("raw/insurance.zip", "MachineLearningRating_v3.txt")?;
///
/// println!("{}", serde_json::to_string_pretty(&result.report)?);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    plan: CleaningPlan,
    remediator: MissingDataRemediator,
    capper: OutlierCapper,
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn plan(&self) -> &CleaningPlan {
        &self.plan
    }

    /// Extract `archive_path`, load `filename` and clean it.
    ///
    /// Extraction and loading failures come back as
    /// [`IngestError::DataLoad`].
    pub fn run(&self, archive_path: impl AsRef<Path>, filename: &str) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let (df, extraction) = extract_and_load(archive_path.as_ref(), filename, &self.config)
            .map_err(IngestError::into_data_load)
            .inspect_err(|e| error!("Pipeline error: {}", e))?;
        self.clean(df, Some(extraction), start_time)
    }

    /// Clean an already loaded table.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        self.clean(df, None, Instant::now())
    }

    fn clean(
        &self,
        mut df: DataFrame,
        extraction: Option<ExtractionSummary>,
        start_time: Instant,
    ) -> Result<PipelineResult> {
        info!("Starting cleaning pipeline...");
        let shape_before = df.shape();
        let missing_before = MissingDataAnalyzer::summarize(&df);
        let mut processing_steps: Vec<String> = Vec::new();

        if let Some(extraction) = &extraction {
            processing_steps.push(format!(
                "Extracted {} files from {} nested archives",
                extraction.file_count(),
                extraction.nested_archives
            ));
        }
        processing_steps.push(format!(
            "Loaded {} rows x {} columns; {} columns have missing values",
            shape_before.0,
            shape_before.1,
            missing_before.len()
        ));

        let remediation = self
            .remediate(&mut df, &mut processing_steps)
            .inspect_err(|e| error!("Pipeline error: {}", e))?;
        let outliers = self
            .cap(&mut df, &mut processing_steps)
            .inspect_err(|e| error!("Pipeline error: {}", e))?;

        let missing_after = MissingDataAnalyzer::summarize(&df);
        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Cleaning complete in {}ms: {:?} -> {:?}",
            duration_ms,
            shape_before,
            df.shape()
        );

        let report = PipelineReport {
            generated_at: chrono::Utc::now(),
            extraction,
            shape_before,
            shape_after: df.shape(),
            missing_before,
            missing_after,
            remediation,
            outliers,
            processing_steps,
            duration_ms,
        };

        Ok(PipelineResult { data: df, report })
    }

    fn remediate(
        &self,
        df: &mut DataFrame,
        processing_steps: &mut Vec<String>,
    ) -> Result<Vec<RemediationSummary>> {
        let mut summaries = Vec::new();
        for (severity, columns) in self.plan.tiers() {
            if columns.is_empty() {
                continue;
            }
            let summary = self.remediator.remediate(df, severity, columns)?;
            for action in &summary.actions {
                processing_steps.push(format!("[{}] {}", severity, describe_action(action)));
            }
            summaries.push(summary);
        }
        Ok(summaries)
    }

    fn cap(&self, df: &mut DataFrame, processing_steps: &mut Vec<String>) -> Result<CapSummary> {
        if self.plan.cap_columns.is_empty() {
            return Ok(CapSummary::default());
        }
        let summary = self.capper.cap(df, &self.plan.cap_columns)?;
        for result in &summary.columns {
            match &result.bounds {
                Some(bounds) => processing_steps.push(format!(
                    "Capped {} outliers in '{}' to [{:.2}, {:.2}]",
                    result.capped(),
                    result.column,
                    bounds.lower,
                    bounds.upper
                )),
                None => processing_steps.push(format!(
                    "Skipped outlier capping for '{}': no present values",
                    result.column
                )),
            }
        }
        Ok(summary)
    }
}

fn describe_action(action: &crate::types::RemediationAction) -> String {
    use crate::types::RemediationAction;
    match action {
        RemediationAction::DroppedColumn { column } => format!("Dropped column '{column}'"),
        RemediationAction::Imputed {
            column,
            filled,
            fill,
            converted_to: None,
        } => format!("Filled {filled} values in '{column}' with {fill}"),
        RemediationAction::Imputed {
            column,
            filled,
            fill,
            converted_to: Some(dtype),
        } => format!("Filled {filled} values in '{column}' with {fill} (now {dtype})"),
        RemediationAction::Unchanged { column } => format!("'{column}' has no missing values"),
        RemediationAction::Skipped { column, reason } => format!("Skipped '{column}': {reason}"),
    }
}

/// Builder for [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    plan: CleaningPlan,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the cleaning plan.
    pub fn plan(mut self, plan: CleaningPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            remediator: MissingDataRemediator::new(&config),
            capper: OutlierCapper::new(&config),
            config,
            plan: self.plan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> DataFrame {
        df![
            "A" => [Some(1.0), Some(2.0), None, Some(4.0), Some(100.0)],
            "B" => [None, None, Some(2.0), Some(3.0), None],
            "C" => [Some("x"), None, Some("x"), Some("y"), Some("x")],
        ]
        .unwrap()
    }

    #[test]
    fn test_plan_with_tier() {
        let plan = CleaningPlan::new()
            .with_tier(MissingSeverity::High, ["B"])
            .with_tier(MissingSeverity::Moderate, vec!["A".to_string()])
            .with_tier(MissingSeverity::Default, ["C"])
            .with_cap_columns(["A"]);

        assert_eq!(plan.high, vec!["B"]);
        assert_eq!(plan.moderate, vec!["A"]);
        assert_eq!(plan.default, vec!["C"]);
        assert_eq!(plan.cap_columns, vec!["A"]);
        assert!(!plan.is_empty());
        assert!(CleaningPlan::new().is_empty());
    }

    #[test]
    fn test_process_applies_plan() {
        let plan = CleaningPlan::new()
            .with_tier(MissingSeverity::High, ["B"])
            .with_tier(MissingSeverity::Moderate, ["A"])
            .with_tier(MissingSeverity::Default, ["C"])
            .with_cap_columns(["A"]);

        let result = Pipeline::builder()
            .plan(plan)
            .build()
            .unwrap()
            .process(sample_frame())
            .unwrap();

        assert_eq!(result.report.shape_before, (5, 3));
        assert_eq!(result.report.shape_after, (5, 2));
        assert!(result.report.missing_after.is_empty());
        assert_eq!(result.report.remediation.len(), 3);
        assert!(result.data.column("B").is_err());
        assert_eq!(result.report.outliers.total_capped(), 1);
        assert!(!result.report.processing_steps.is_empty());
        assert!(result.report.extraction.is_none());
    }

    #[test]
    fn test_empty_plan_only_reports() {
        let result = Pipeline::builder()
            .build()
            .unwrap()
            .process(sample_frame())
            .unwrap();

        assert!(result.data.equals_missing(&sample_frame()));
        assert_eq!(result.report.missing_before, result.report.missing_after);
        assert!(result.report.remediation.is_empty());
    }

    #[test]
    fn test_process_error_aborts() {
        let plan = CleaningPlan::new().with_cap_columns(["C"]);
        let err = Pipeline::builder()
            .plan(plan)
            .build()
            .unwrap()
            .process(sample_frame())
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_COLUMN_TYPE");
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = PipelineConfig::default();
        config.iqr_multiplier = -1.0;

        let err = Pipeline::builder().config(config).build().unwrap_err();
        assert!(matches!(err, IngestError::InvalidConfig(_)));
    }

    #[test]
    fn test_report_serializes() {
        let result = Pipeline::builder()
            .plan(CleaningPlan::new().with_tier(MissingSeverity::Moderate, ["A", "B"]))
            .build()
            .unwrap()
            .process(sample_frame())
            .unwrap();

        let json = serde_json::to_value(&result.report).unwrap();
        assert_eq!(json["remediation"][0]["severity"], "moderate");
        assert_eq!(json["remediation"][0]["actions"][0]["action"], "imputed");
        assert_eq!(json["remediation"][0]["actions"][0]["fill"]["kind"], "median");
    }
}
