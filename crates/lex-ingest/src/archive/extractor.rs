//! Recursive zip extraction.

use crate::config::PipelineConfig;
use crate::error::{IngestError, Result};
use crate::types::{EntryKind, ExtractionSummary};
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info};
use zip::ZipArchive;

/// Upper bound on the buffer reserved up front for a nested archive; the
/// declared size comes from the archive header and is not trusted.
const MAX_NESTED_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Extracts zip archives, optionally descending into nested archives.
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    /// Lowercased suffix such as ".zip".
    archive_suffix: String,
}

impl ArchiveExtractor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            archive_suffix: config.archive_suffix(),
        }
    }

    /// Extract every entry as-is, including nested archives.
    pub fn extract(
        &self,
        archive_path: impl AsRef<Path>,
        dest_dir: impl AsRef<Path>,
    ) -> Result<ExtractionSummary> {
        self.run(archive_path.as_ref(), dest_dir.as_ref(), false)
    }

    /// Extract every entry, unpacking nested archives into `dest_dir` until
    /// no nested archive entries remain.
    pub fn extract_nested(
        &self,
        archive_path: impl AsRef<Path>,
        dest_dir: impl AsRef<Path>,
    ) -> Result<ExtractionSummary> {
        self.run(archive_path.as_ref(), dest_dir.as_ref(), true)
    }

    /// Classify an entry by its name.
    pub fn classify(&self, name: &str, is_dir: bool) -> EntryKind {
        if is_dir {
            EntryKind::Directory
        } else if name.to_ascii_lowercase().ends_with(&self.archive_suffix) {
            EntryKind::NestedArchive
        } else {
            EntryKind::File
        }
    }

    fn run(&self, archive_path: &Path, dest_dir: &Path, descend: bool) -> Result<ExtractionSummary> {
        let label = archive_path.display().to_string();
        info!("Extracting archive: {}", label);

        fs::create_dir_all(dest_dir)?;

        let file = File::open(archive_path).map_err(|e| IngestError::Extraction {
            archive: label.clone(),
            reason: e.to_string(),
        })?;
        let mut archive = ZipArchive::new(file).map_err(|e| IngestError::Extraction {
            archive: label.clone(),
            reason: e.to_string(),
        })?;

        let mut summary = ExtractionSummary::new(dest_dir);
        self.extract_entries(&mut archive, &label, dest_dir, 0, descend, &mut summary)?;

        info!(
            "Extracted {} files ({} nested archives, depth {}) to {}",
            summary.file_count(),
            summary.nested_archives,
            summary.max_depth,
            dest_dir.display()
        );
        Ok(summary)
    }

    fn extract_entries<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        label: &str,
        dest_dir: &Path,
        depth: usize,
        descend: bool,
        summary: &mut ExtractionSummary,
    ) -> Result<()> {
        summary.max_depth = summary.max_depth.max(depth);

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| IngestError::Extraction {
                archive: label.to_string(),
                reason: e.to_string(),
            })?;
            let name = entry.name().to_string();

            let kind = match self.classify(&name, entry.is_dir()) {
                EntryKind::NestedArchive if !descend => EntryKind::File,
                kind => kind,
            };

            match kind {
                EntryKind::NestedArchive => {
                    let nested_label = format!("{label}!{name}");
                    debug!("Descending into nested archive {}", nested_label);

                    let mut buffer =
                        Vec::with_capacity(entry.size().min(MAX_NESTED_PREALLOCATION) as usize);
                    entry
                        .read_to_end(&mut buffer)
                        .map_err(|e| IngestError::Extraction {
                            archive: nested_label.clone(),
                            reason: e.to_string(),
                        })?;
                    drop(entry);

                    let mut nested = ZipArchive::new(Cursor::new(buffer)).map_err(|e| {
                        IngestError::Extraction {
                            archive: nested_label.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    summary.nested_archives += 1;
                    self.extract_entries(
                        &mut nested,
                        &nested_label,
                        dest_dir,
                        depth + 1,
                        descend,
                        summary,
                    )?;
                }
                EntryKind::Directory => {
                    let relative = entry
                        .enclosed_name()
                        .ok_or_else(|| IngestError::UnsafeEntryPath(name.clone()))?;
                    fs::create_dir_all(dest_dir.join(relative))?;
                    summary.directories_created += 1;
                }
                EntryKind::File => {
                    let relative = entry
                        .enclosed_name()
                        .ok_or_else(|| IngestError::UnsafeEntryPath(name.clone()))?;
                    let out_path = dest_dir.join(&relative);
                    if let Some(parent) = out_path.parent() {
                        fs::create_dir_all(parent)?;
                    }

                    let mut out_file = File::create(&out_path)?;
                    io::copy(&mut entry, &mut out_file).map_err(|e| IngestError::Extraction {
                        archive: label.to_string(),
                        reason: format!("{name}: {e}"),
                    })?;

                    debug!("Extracted {} -> {}", name, out_path.display());
                    summary.files.push(relative);
                }
            }
        }

        Ok(())
    }
}
