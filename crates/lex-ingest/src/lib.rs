//! Archived Dataset Ingestion and Cleaning Library
//!
//! Turns a compressed, possibly nested, pipe-delimited dataset into a clean,
//! analysis-ready polars `DataFrame`.
//!
//! # Overview
//!
//! - **Extraction**: Recursively unpacks zip archives, including zip-within-zip at any depth
//! - **Loading**: Parses pipe-delimited text into a typed table
//! - **Missing-Data Diagnosis**: Per-column missing counts and percentages, ranked
//! - **Remediation**: Drops or imputes columns according to a caller-supplied severity tier
//! - **Outlier Capping**: Clamps numeric columns to their IQR bounds
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_ingest::{
//!     MissingSeverity, PipelineConfig, cap_outliers, load_data, missing_data_summary,
//!     remediate_missing,
//! };
//!
//! let config = PipelineConfig::builder().destination_directory("data").build()?;
//! let df = load_data("raw/insurance.zip", "MachineLearningRating_v3.txt", &config)?;
//!
//! for col in &missing_data_summary(&df).columns {
//!     println!("{}: {} ({:.2}%)", col.column, col.missing_count, col.missing_percentage);
//! }
//!
//! let df = remediate_missing(df, MissingSeverity::High, &["NumberOfVehiclesInFleet"])?;
//! let df = remediate_missing(df, MissingSeverity::Moderate, &["Bank", "AccountType"])?;
//! let df = remediate_missing(df, None, &["Gender"])?;
//! let df = cap_outliers(df, &["TotalPremium", "TotalClaims"])?;
//! ```
//!
//! # Pipeline
//!
//! The same steps can be described once as a [`CleaningPlan`] and run
//! through a [`Pipeline`], which also produces a serializable
//! [`PipelineReport`]:
//!
//! ```rust,ignore
//! use lex_ingest::{CleaningPlan, MissingSeverity, Pipeline};
//!
//! let plan = CleaningPlan::new()
//!     .with_tier(MissingSeverity::High, ["NumberOfVehiclesInFleet"])
//!     .with_tier(MissingSeverity::Moderate, ["Bank", "AccountType"])
//!     .with_cap_columns(["TotalPremium"]);
//!
//! let result = Pipeline::builder().plan(plan).build()?.run("raw/insurance.zip", "data.txt")?;
//! println!("{}", serde_json::to_string_pretty(&result.report)?);
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod quality;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use archive::{ArchiveExtractor, extract_archive, extract_nested_archive};
pub use config::{
    ConfigValidationError, DEFAULT_DESTINATION_DIRECTORY, DegenerateColumnPolicy, PipelineConfig,
    PipelineConfigBuilder,
};
pub use error::{IngestError, Result as IngestResult, ResultExt};
pub use imputers::{MissingDataRemediator, StatisticalImputer, remediate_missing};
pub use loader::{LoaderOptions, TableLoader, load_data, load_delimited_table};
pub use pipeline::{CleaningPlan, OutlierCapper, Pipeline, PipelineBuilder, cap_outliers};
pub use quality::{MissingDataAnalyzer, missing_data_summary};
pub use types::{
    CapSummary, ColumnCapResult, EntryKind, ExtractionSummary, FillValue, IqrBounds,
    MissingColumnSummary, MissingDataReport, MissingSeverity, PipelineReport, PipelineResult,
    RemediationAction, RemediationSummary,
};
pub use utils::is_numeric_dtype;
