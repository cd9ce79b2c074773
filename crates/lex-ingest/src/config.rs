//! Configuration types for the ingestion pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default directory extracted files are written to.
pub const DEFAULT_DESTINATION_DIRECTORY: &str = "../data";

/// Default field separator of the delimited data files.
pub const DEFAULT_SEPARATOR: u8 = b'|';

/// Default IQR multiplier used to derive outlier bounds.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// What to do with a column that has no median or mode because every
/// value is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DegenerateColumnPolicy {
    /// Fill with the configured sentinel value
    #[default]
    Sentinel,
    /// Leave the column untouched
    Skip,
    /// Abort with `IngestError::NoValidValues`
    Fail,
}

/// Configuration for the ingestion pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_ingest::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .destination_directory("work/extracted")
///     .iqr_multiplier(3.0)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where extracted files are written.
    /// Default: "../data"
    pub destination_directory: PathBuf,

    /// Field separator of the data file.
    /// Default: b'|'
    pub separator: u8,

    /// Number of rows scanned for type inference. `None` scans the whole file.
    /// Default: None
    pub infer_schema_length: Option<usize>,

    /// File extension (without dot) identifying nested archive entries.
    /// Default: "zip"
    pub archive_extension: String,

    /// Multiplier applied to the IQR when deriving outlier bounds.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Policy for columns where no median or mode can be computed.
    /// Default: Sentinel
    pub degenerate_policy: DegenerateColumnPolicy,

    /// Sentinel written into all-missing numeric columns.
    /// Default: 0.0
    pub numeric_sentinel: f64,

    /// Sentinel written into all-missing text columns.
    /// Default: "Unknown"
    pub text_sentinel: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            destination_directory: PathBuf::from(DEFAULT_DESTINATION_DIRECTORY),
            separator: DEFAULT_SEPARATOR,
            infer_schema_length: None,
            archive_extension: "zip".to_string(),
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            degenerate_policy: DegenerateColumnPolicy::default(),
            numeric_sentinel: 0.0,
            text_sentinel: "Unknown".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.separator.is_ascii() || matches!(self.separator, b'"' | b'\n' | b'\r') {
            return Err(ConfigValidationError::InvalidSeparator(self.separator));
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::InvalidIqrMultiplier(
                self.iqr_multiplier,
            ));
        }

        if self.archive_extension.trim_start_matches('.').is_empty() {
            return Err(ConfigValidationError::EmptyArchiveExtension);
        }

        if !self.numeric_sentinel.is_finite() {
            return Err(ConfigValidationError::InvalidSentinel(self.numeric_sentinel));
        }

        Ok(())
    }

    /// The nested-archive suffix including its leading dot, lowercased.
    pub fn archive_suffix(&self) -> String {
        format!(
            ".{}",
            self.archive_extension
                .trim_start_matches('.')
                .to_ascii_lowercase()
        )
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid separator byte {0:#04x} (must be ASCII and not a quote or newline)")]
    InvalidSeparator(u8),

    #[error("Invalid IQR multiplier: {0} (must be finite and greater than 0)")]
    InvalidIqrMultiplier(f64),

    #[error("Archive extension must not be empty")]
    EmptyArchiveExtension,

    #[error("Invalid numeric sentinel: {0} (must be finite)")]
    InvalidSentinel(f64),
}

impl From<ConfigValidationError> for crate::error::IngestError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::IngestError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    destination_directory: Option<PathBuf>,
    separator: Option<u8>,
    infer_schema_length: Option<Option<usize>>,
    archive_extension: Option<String>,
    iqr_multiplier: Option<f64>,
    degenerate_policy: Option<DegenerateColumnPolicy>,
    numeric_sentinel: Option<f64>,
    text_sentinel: Option<String>,
}

impl PipelineConfigBuilder {
    /// Set the directory extracted files are written to.
    pub fn destination_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination_directory = Some(path.into());
        self
    }

    /// Set the field separator of the data file.
    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Limit type inference to the first `rows` rows.
    ///
    /// Pass `None` to scan the whole file.
    pub fn infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Set the extension that marks nested archive entries.
    pub fn archive_extension(mut self, extension: impl Into<String>) -> Self {
        self.archive_extension = Some(extension.into());
        self
    }

    /// Set the IQR multiplier for outlier bounds.
    ///
    /// # Arguments
    /// * `k` - Bounds become `Q1 - k*IQR` and `Q3 + k*IQR`
    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    /// Set the policy for all-missing columns during imputation.
    pub fn degenerate_policy(mut self, policy: DegenerateColumnPolicy) -> Self {
        self.degenerate_policy = Some(policy);
        self
    }

    /// Set the sentinel for all-missing numeric columns.
    pub fn numeric_sentinel(mut self, value: f64) -> Self {
        self.numeric_sentinel = Some(value);
        self
    }

    /// Set the sentinel for all-missing text columns.
    pub fn text_sentinel(mut self, value: impl Into<String>) -> Self {
        self.text_sentinel = Some(value.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            destination_directory: self
                .destination_directory
                .unwrap_or(defaults.destination_directory),
            separator: self.separator.unwrap_or(defaults.separator),
            infer_schema_length: self
                .infer_schema_length
                .unwrap_or(defaults.infer_schema_length),
            archive_extension: self
                .archive_extension
                .unwrap_or(defaults.archive_extension),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            degenerate_policy: self.degenerate_policy.unwrap_or_default(),
            numeric_sentinel: self.numeric_sentinel.unwrap_or(defaults.numeric_sentinel),
            text_sentinel: self.text_sentinel.unwrap_or(defaults.text_sentinel),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.destination_directory, PathBuf::from("../data"));
        assert_eq!(config.separator, b'|');
        assert_eq!(config.infer_schema_length, None);
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(config.degenerate_policy, DegenerateColumnPolicy::Sentinel);
        assert_eq!(config.text_sentinel, "Unknown");
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let config = PipelineConfig::builder().build().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .destination_directory("scratch/out")
            .separator(b';')
            .infer_schema_length(Some(500))
            .archive_extension(".ZIP")
            .iqr_multiplier(3.0)
            .degenerate_policy(DegenerateColumnPolicy::Fail)
            .numeric_sentinel(-1.0)
            .text_sentinel("n/a")
            .build()
            .unwrap();

        assert_eq!(config.destination_directory, PathBuf::from("scratch/out"));
        assert_eq!(config.separator, b';');
        assert_eq!(config.infer_schema_length, Some(500));
        assert_eq!(config.archive_suffix(), ".zip");
        assert_eq!(config.iqr_multiplier, 3.0);
        assert_eq!(config.degenerate_policy, DegenerateColumnPolicy::Fail);
        assert_eq!(config.numeric_sentinel, -1.0);
        assert_eq!(config.text_sentinel, "n/a");
    }

    #[test]
    fn test_validation_invalid_iqr_multiplier() {
        let result = PipelineConfig::builder().iqr_multiplier(0.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidIqrMultiplier(_)
        ));

        let result = PipelineConfig::builder().iqr_multiplier(f64::NAN).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_invalid_separator() {
        let result = PipelineConfig::builder().separator(b'"').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidSeparator(b'"')
        ));
    }

    #[test]
    fn test_validation_empty_extension() {
        let result = PipelineConfig::builder().archive_extension(".").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyArchiveExtension
        ));
    }

    #[test]
    fn test_pipeline_config_from_json() {
        let json = r#"{
            "destination_directory": "custom_output",
            "separator": 44,
            "infer_schema_length": 100,
            "archive_extension": "zip",
            "iqr_multiplier": 2.0,
            "degenerate_policy": "Skip",
            "numeric_sentinel": 0.0,
            "text_sentinel": "Unknown"
        }"#;

        let config: PipelineConfig =
            serde_json::from_str(json).expect("Should deserialize from JSON");

        assert_eq!(config.destination_directory.to_str().unwrap(), "custom_output");
        assert_eq!(config.separator, b',');
        assert_eq!(config.infer_schema_length, Some(100));
        assert_eq!(config.iqr_multiplier, 2.0);
        assert_eq!(config.degenerate_policy, DegenerateColumnPolicy::Skip);
        assert!(config.validate().is_ok());
    }
}
