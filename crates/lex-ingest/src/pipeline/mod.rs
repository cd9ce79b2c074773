//! Pipeline module.
//!
//! This module provides the cleaning pipeline and the outlier capper it uses.

mod builder;
pub mod outliers;

pub use builder::{CleaningPlan, Pipeline, PipelineBuilder};
pub use outliers::{OutlierCapper, cap_outliers};
