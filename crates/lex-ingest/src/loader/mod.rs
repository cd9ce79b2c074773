//! Delimited table loading.
//!
//! Reads pipe-delimited text files into a polars `DataFrame`, and composes
//! extraction with loading for the single-call `load_data` entry point.

use crate::archive::ArchiveExtractor;
use crate::config::PipelineConfig;
use crate::error::{IngestError, Result};
use polars::io::csv::read::{CsvReadOptions, NullValues};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Delimiters we recognise in a header when the configured one did not split it.
const OTHER_DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Field values read as missing, in addition to empty fields. Same list
/// pandas' `read_csv` uses by default.
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Options controlling how delimited files are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderOptions {
    pub separator: u8,
    pub infer_schema_length: Option<usize>,
}

impl From<&PipelineConfig> for LoaderOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            separator: config.separator,
            infer_schema_length: config.infer_schema_length,
        }
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

/// Loads delimited text files into tables.
#[derive(Debug, Clone, Default)]
pub struct TableLoader {
    options: LoaderOptions,
}

impl TableLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Load `dir/filename` into a DataFrame.
    ///
    /// Any failure is reported as [`IngestError::Load`] naming the file and
    /// the underlying cause.
    pub fn load(&self, dir: impl AsRef<Path>, filename: &str) -> Result<DataFrame> {
        let path = dir.as_ref().join(filename);
        self.load_path(&path).map_err(|reason| IngestError::Load {
            path: path.clone(),
            reason,
        })
    }

    fn load_path(&self, path: &Path) -> std::result::Result<DataFrame, String> {
        if !path.is_file() {
            return Err("file not found".to_string());
        }

        info!("Loading table from: {}", path.display());

        let separator = self.options.separator;
        let markers: Vec<PlSmallStr> = MISSING_MARKERS
            .iter()
            .copied()
            .map(PlSmallStr::from_static)
            .collect();
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.options.infer_schema_length)
            .map_parse_options(|opts| {
                opts.with_separator(separator)
                    .with_null_values(Some(NullValues::AllColumns(markers.clone())))
            })
            .try_into_reader_with_file_path(Some(PathBuf::from(path)))
            .map_err(|e| e.to_string())?
            .finish()
            .map_err(|e| e.to_string())?;

        self.check_delimiter(&df)?;

        debug!("Column dtypes: {:?}", df.dtypes());
        info!("Table loaded: {} rows x {} columns", df.height(), df.width());
        Ok(df)
    }

    /// A single column whose header and every data row split into the same
    /// number of fields on another delimiter means the file was split on the
    /// wrong character.
    fn check_delimiter(&self, df: &DataFrame) -> std::result::Result<(), String> {
        if df.width() != 1 || df.height() == 0 {
            return Ok(());
        }
        let configured = self.options.separator as char;
        let header = df.get_column_names()[0].as_str();
        let rows = df.get_columns()[0]
            .as_materialized_series()
            .cast(&DataType::String)
            .map_err(|e| e.to_string())?;
        let rows = rows.str().map_err(|e| e.to_string())?;
        if rows.null_count() == rows.len() {
            return Ok(());
        }

        let mismatch = OTHER_DELIMITERS
            .iter()
            .copied()
            .filter(|c| *c != configured)
            .find(|delimiter| {
                let fields = header.split(*delimiter).count();
                fields > 1
                    && rows
                        .into_iter()
                        .flatten()
                        .all(|row| row.split(*delimiter).count() == fields)
            });

        if let Some(found) = mismatch {
            warn!("Header '{}' was not split on '{}'", header, configured);
            return Err(format!(
                "delimiter mismatch: expected '{}' but header looks {:?}-delimited",
                configured, found
            ));
        }
        Ok(())
    }
}

/// Load a pipe-delimited file from an extraction directory.
pub fn load_delimited_table(dir: impl AsRef<Path>, filename: &str) -> Result<DataFrame> {
    TableLoader::default().load(dir, filename)
}

/// Extract `outer_archive_path` (recursively) into the configured
/// destination directory and load `filename` from it.
///
/// Every extraction or loading failure is wrapped into
/// [`IngestError::DataLoad`].
pub fn load_data(
    outer_archive_path: impl AsRef<Path>,
    filename: &str,
    config: &PipelineConfig,
) -> Result<DataFrame> {
    extract_and_load(outer_archive_path.as_ref(), filename, config)
        .map(|(df, _)| df)
        .map_err(IngestError::into_data_load)
}

pub(crate) fn extract_and_load(
    outer_archive_path: &Path,
    filename: &str,
    config: &PipelineConfig,
) -> Result<(DataFrame, crate::types::ExtractionSummary)> {
    config.validate()?;
    let destination = &config.destination_directory;
    std::fs::create_dir_all(destination)?;

    let summary = ArchiveExtractor::new(config).extract_nested(outer_archive_path, destination)?;
    let df = TableLoader::new(LoaderOptions::from(config)).load(destination, filename)?;
    Ok((df, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn write_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_load_pipe_delimited_table() {
        let scratch = tempfile::tempdir().unwrap();
        write_file(
            scratch.path(),
            "data.txt",
            "Policy ID|Gender|TotalPremium\n1|Male|21.93\n2||0\n3|Female|512.8\n",
        );

        let df = load_delimited_table(scratch.path(), "data.txt").unwrap();

        assert_eq!(df.shape(), (3, 3));
        let names: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["Policy ID", "Gender", "TotalPremium"]);
        assert!(df.column("Policy ID").unwrap().dtype().is_integer());
        assert_eq!(df.column("TotalPremium").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Gender").unwrap().dtype(), &DataType::String);
        // empty fields are read as nulls
        assert_eq!(df.column("Gender").unwrap().null_count(), 1);
    }

    #[test]
    fn test_mixed_column_falls_back_to_text() {
        let scratch = tempfile::tempdir().unwrap();
        write_file(scratch.path(), "mixed.txt", "code|n\n10|1\nA7|2\n33|3\n");

        let df = load_delimited_table(scratch.path(), "mixed.txt").unwrap();

        assert_eq!(df.column("code").unwrap().dtype(), &DataType::String);
        assert!(df.column("n").unwrap().dtype().is_integer());
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let scratch = tempfile::tempdir().unwrap();
        let err = load_delimited_table(scratch.path(), "absent.txt").unwrap_err();
        match err {
            IngestError::Load { path, reason } => {
                assert!(path.ends_with("absent.txt"));
                assert_eq!(reason, "file not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_delimiter_mismatch_is_load_error() {
        let scratch = tempfile::tempdir().unwrap();
        write_file(scratch.path(), "commas.txt", "a,b,c\n1,2,3\n");

        let err = load_delimited_table(scratch.path(), "commas.txt").unwrap_err();

        assert!(matches!(err, IngestError::Load { .. }));
        assert!(err.to_string().contains("delimiter mismatch"));
    }

    #[test]
    fn test_missing_markers_are_read_as_null() {
        let scratch = tempfile::tempdir().unwrap();
        write_file(scratch.path(), "markers.txt", "x|y\n1.5|a\nNA|b\n3.5|NULL\nNaN|c\n");

        let df = load_delimited_table(scratch.path(), "markers.txt").unwrap();

        assert_eq!(df.column("x").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("x").unwrap().null_count(), 2);
        assert_eq!(df.column("y").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("y").unwrap().null_count(), 1);
    }

    #[test]
    fn test_invalid_utf8_is_load_error() {
        let scratch = tempfile::tempdir().unwrap();
        fs::write(scratch.path().join("binary.txt"), b"a|b\n\xff\xfe|1\n").unwrap();

        let err = load_delimited_table(scratch.path(), "binary.txt").unwrap_err();

        match err {
            IngestError::Load { path, reason } => {
                assert!(path.ends_with("binary.txt"));
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_single_column_header_with_comma_is_fine() {
        let scratch = tempfile::tempdir().unwrap();
        write_file(scratch.path(), "names.txt", "Name, Surname\nSmith\nJones\n");

        let df = load_delimited_table(scratch.path(), "names.txt").unwrap();

        assert_eq!(df.shape(), (2, 1));
        assert_eq!(df.get_column_names()[0].as_str(), "Name, Surname");
    }

    #[test]
    fn test_single_column_file_is_fine() {
        let scratch = tempfile::tempdir().unwrap();
        write_file(scratch.path(), "one.txt", "value\n1\n2\n");

        let df = load_delimited_table(scratch.path(), "one.txt").unwrap();
        assert_eq!(df.shape(), (2, 1));
    }

    #[test]
    fn test_custom_separator() {
        let scratch = tempfile::tempdir().unwrap();
        write_file(scratch.path(), "semi.txt", "a;b\n1;x\n");

        let loader = TableLoader::new(LoaderOptions {
            separator: b';',
            infer_schema_length: Some(10),
        });
        let df = loader.load(scratch.path(), "semi.txt").unwrap();
        assert_eq!(df.shape(), (1, 2));
    }

    #[test]
    fn test_load_data_wraps_encoding_failure() {
        use std::io::Write;
        use ::zip::write::SimpleFileOptions;

        let scratch = tempfile::tempdir().unwrap();
        let mut writer = ::zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("binary.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"a|b\n\xff\xfe|1\n").unwrap();
        let archive = scratch.path().join("binary.zip");
        fs::write(&archive, writer.finish().unwrap().into_inner()).unwrap();
        let config = PipelineConfig::builder()
            .destination_directory(scratch.path().join("data"))
            .build()
            .unwrap();

        let err = load_data(&archive, "binary.txt", &config).unwrap_err();

        assert!(matches!(err, IngestError::DataLoad(_)));
        assert!(matches!(err.root_cause(), IngestError::Load { .. }));
    }

    #[test]
    fn test_load_data_wraps_failures() {
        let scratch = tempfile::tempdir().unwrap();
        let config = PipelineConfig::builder()
            .destination_directory(scratch.path().join("data"))
            .build()
            .unwrap();

        let err = load_data(scratch.path().join("missing.zip"), "x.txt", &config).unwrap_err();

        assert!(matches!(err, IngestError::DataLoad(_)));
        assert!(err.to_string().starts_with("Error loading data: "));
        assert!(matches!(err.root_cause(), IngestError::Extraction { .. }));
    }
}
