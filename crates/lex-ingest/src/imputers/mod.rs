//! Missing-value remediation module.
//!
//! This module provides:
//! - Statistical imputation (median for numeric, mode for text)
//! - Severity-driven remediation (drop column or impute)

mod remediator;
mod statistical;

pub use remediator::{MissingDataRemediator, remediate_missing};
pub use statistical::StatisticalImputer;
