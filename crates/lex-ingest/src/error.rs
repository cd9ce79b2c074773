//! Custom error types for the ingestion and cleaning pipeline.
//!
//! This module provides a single error hierarchy using `thiserror`.
//! Extraction and loading failures keep their own variants so callers can
//! match on them, and [`IngestError::DataLoad`] wraps either one at the
//! `load_data` boundary so top-level handlers see one error kind carrying
//! the original cause text.
//!
//! Errors are serializable as `{ code, message }` so they can be written
//! into JSON run reports.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the ingestion pipeline.
#[derive(Error, Debug)]
pub enum IngestError {
    /// An archive (or a nested archive entry) could not be read.
    #[error("Failed to extract '{archive}': {reason}")]
    Extraction { archive: String, reason: String },

    /// An archive entry would be written outside the destination directory.
    #[error("Archive entry '{0}' has an unsafe path")]
    UnsafeEntryPath(String),

    /// A delimited file could not be loaded into a table.
    #[error("Failed to load '{}': {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// Wrapped failure from the combined extract-and-load step.
    #[error("Error loading data: {0}")]
    DataLoad(#[source] Box<IngestError>),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in table")]
    ColumnNotFound(String),

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}': no mode/median computable")]
    NoValidValues(String),

    /// Column has a dtype the operation cannot handle.
    #[error("Column '{column}' has type {actual}, expected {expected}")]
    InvalidColumnType {
        column: String,
        expected: String,
        actual: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<IngestError>,
    },
}

impl IngestError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        IngestError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Wrap an extraction or loading failure into the single error kind
    /// surfaced by `load_data`.
    pub fn into_data_load(self) -> Self {
        match self {
            already @ IngestError::DataLoad(_) => already,
            other => IngestError::DataLoad(Box::new(other)),
        }
    }

    /// Get a stable error code for report consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Extraction { .. } => "EXTRACTION_FAILED",
            Self::UnsafeEntryPath(_) => "UNSAFE_ENTRY_PATH",
            Self::Load { .. } => "LOAD_FAILED",
            Self::DataLoad(_) => "DATA_LOAD_FAILED",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::InvalidColumnType { .. } => "INVALID_COLUMN_TYPE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// The innermost error, skipping `DataLoad` and context wrappers.
    pub fn root_cause(&self) -> &IngestError {
        match self {
            Self::DataLoad(inner) => inner.root_cause(),
            Self::WithContext { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for IngestError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("IngestError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| IngestError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            IngestError::ColumnNotFound("test".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            IngestError::NoValidValues("D".to_string()).error_code(),
            "NO_VALID_VALUES"
        );
    }

    #[test]
    fn test_data_load_message_carries_cause() {
        let inner = IngestError::Load {
            path: PathBuf::from("data/missing.txt"),
            reason: "file not found".to_string(),
        };
        let wrapped = inner.into_data_load();

        assert_eq!(wrapped.error_code(), "DATA_LOAD_FAILED");
        let message = wrapped.to_string();
        assert!(message.starts_with("Error loading data: "));
        assert!(message.contains("file not found"));
        assert!(matches!(wrapped.root_cause(), IngestError::Load { .. }));
    }

    #[test]
    fn test_data_load_is_not_double_wrapped() {
        let wrapped = IngestError::InvalidConfig("x".to_string())
            .into_data_load()
            .into_data_load();
        match wrapped {
            IngestError::DataLoad(inner) => {
                assert!(matches!(*inner, IngestError::InvalidConfig(_)))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_serialization() {
        let error = IngestError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context() {
        let error =
            IngestError::ColumnNotFound("test".to_string()).with_context("During remediation");
        assert!(error.to_string().contains("During remediation"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }
}
