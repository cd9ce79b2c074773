//! Data quality analysis module.
//!
//! This module diagnoses missing data in a table.

mod analyzer;

pub use analyzer::{MissingDataAnalyzer, missing_data_summary};
