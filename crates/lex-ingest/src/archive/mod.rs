//! Archive extraction module.
//!
//! Unpacks zip archives to a destination directory, descending into
//! zip-within-zip entries at any depth.

mod extractor;

pub use extractor::ArchiveExtractor;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::types::ExtractionSummary;
use std::path::Path;

/// Extract every entry of `archive_path` into `dest_dir` as-is.
///
/// Nested archives are written as regular files.
pub fn extract_archive(
    archive_path: impl AsRef<Path>,
    dest_dir: impl AsRef<Path>,
) -> Result<ExtractionSummary> {
    ArchiveExtractor::new(&PipelineConfig::default()).extract(archive_path, dest_dir)
}

/// Extract `outer_archive_path` into `dest_dir`, recursively unpacking any
/// nested `.zip` entry into the same destination root.
pub fn extract_nested_archive(
    outer_archive_path: impl AsRef<Path>,
    dest_dir: impl AsRef<Path>,
) -> Result<ExtractionSummary> {
    ArchiveExtractor::new(&PipelineConfig::default()).extract_nested(outer_archive_path, dest_dir)
}
