use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

// ============================================================================
// Extraction
// ============================================================================

/// What an archive entry turned into during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
    NestedArchive,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub destination: PathBuf,
    /// Leaf files written, relative to `destination`, in extraction order.
    pub files: Vec<PathBuf>,
    pub directories_created: usize,
    pub nested_archives: usize,
    /// 0 for a flat archive, 1 for zip-in-zip, and so on.
    pub max_depth: usize,
}

impl ExtractionSummary {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            ..Default::default()
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

// ============================================================================
// Missing data
// ============================================================================

/// Caller-supplied classification of a column's missing-data burden.
///
/// `Moderate` and `Default` share the same imputation policy; there is no
/// row-dropping tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingSeverity {
    /// Drop the column entirely
    High,
    /// Impute with median (numeric) or mode (text)
    Moderate,
    /// No tier given; imputes like `Moderate`
    #[default]
    Default,
}

impl MissingSeverity {
    /// Parse an optional tier name. Unknown or absent names map to `Default`.
    pub fn from_option(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or(MissingSeverity::Default)
    }

    pub fn drops_columns(self) -> bool {
        matches!(self, MissingSeverity::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MissingSeverity::High => "high",
            MissingSeverity::Moderate => "moderate",
            MissingSeverity::Default => "default",
        }
    }
}

impl FromStr for MissingSeverity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "high" => MissingSeverity::High,
            "moderate" => MissingSeverity::Moderate,
            _ => MissingSeverity::Default,
        })
    }
}

impl std::fmt::Display for MissingSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingColumnSummary {
    pub column: String,
    pub missing_count: usize,
    pub missing_percentage: f64,
}

impl MissingColumnSummary {
    /// Suggest a tier from the missing percentage.
    ///
    /// Columns at or above `high_threshold_pct` are `High`, anything else
    /// `Moderate`. Nothing in the pipeline calls this implicitly.
    pub fn suggested_severity(&self, high_threshold_pct: f64) -> MissingSeverity {
        if self.missing_percentage >= high_threshold_pct {
            MissingSeverity::High
        } else {
            MissingSeverity::Moderate
        }
    }
}

/// Per-column missing counts, sorted by count descending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingDataReport {
    pub total_rows: usize,
    pub columns: Vec<MissingColumnSummary>,
}

impl MissingDataReport {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, column: &str) -> Option<&MissingColumnSummary> {
        self.columns.iter().find(|c| c.column == column)
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing_count).sum()
    }

    /// Names of columns whose missing percentage is at least `pct`.
    pub fn columns_at_or_above(&self, pct: f64) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.missing_percentage >= pct)
            .map(|c| c.column.clone())
            .collect()
    }
}

// ============================================================================
// Remediation
// ============================================================================

/// Value used to fill a column's nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FillValue {
    Median { value: f64 },
    Mode { value: String },
    /// No median or mode was computable because every value is missing.
    Sentinel { value: String, reason: String },
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FillValue::Median { value } => write!(f, "median {value:.2}"),
            FillValue::Mode { value } => write!(f, "mode '{value}'"),
            FillValue::Sentinel { value, reason } => write!(f, "sentinel '{value}' ({reason})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RemediationAction {
    DroppedColumn {
        column: String,
    },
    Imputed {
        column: String,
        filled: usize,
        fill: FillValue,
        /// New dtype when filling could not keep the column's original one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        converted_to: Option<String>,
    },
    /// Column had no missing values.
    Unchanged {
        column: String,
    },
    /// All values missing and the degenerate policy is `Skip`.
    Skipped {
        column: String,
        reason: String,
    },
}

impl RemediationAction {
    pub fn column(&self) -> &str {
        match self {
            RemediationAction::DroppedColumn { column }
            | RemediationAction::Imputed { column, .. }
            | RemediationAction::Unchanged { column }
            | RemediationAction::Skipped { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationSummary {
    pub severity: MissingSeverity,
    pub actions: Vec<RemediationAction>,
}

impl RemediationSummary {
    pub fn dropped_columns(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter(|a| matches!(a, RemediationAction::DroppedColumn { .. }))
            .map(|a| a.column())
            .collect()
    }

    pub fn values_filled(&self) -> usize {
        self.actions
            .iter()
            .map(|a| match a {
                RemediationAction::Imputed { filled, .. } => *filled,
                _ => 0,
            })
            .sum()
    }
}

// ============================================================================
// Outliers
// ============================================================================

/// Interquartile-range bounds of one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn from_quartiles(q1: f64, q3: f64, multiplier: f64) -> Self {
        let iqr = q3 - q1;
        Self {
            q1,
            q3,
            iqr,
            lower: q1 - multiplier * iqr,
            upper: q3 + multiplier * iqr,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.lower {
            self.lower
        } else if value > self.upper {
            self.upper
        } else {
            value
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnCapResult {
    pub column: String,
    /// `None` when the column has no present values.
    pub bounds: Option<IqrBounds>,
    pub capped_low: usize,
    pub capped_high: usize,
}

impl ColumnCapResult {
    pub fn capped(&self) -> usize {
        self.capped_low + self.capped_high
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapSummary {
    pub columns: Vec<ColumnCapResult>,
}

impl CapSummary {
    pub fn total_capped(&self) -> usize {
        self.columns.iter().map(|c| c.capped()).sum()
    }

    pub fn get(&self, column: &str) -> Option<&ColumnCapResult> {
        self.columns.iter().find(|c| c.column == column)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Serializable record of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionSummary>,
    pub shape_before: (usize, usize),
    pub shape_after: (usize, usize),
    pub missing_before: MissingDataReport,
    pub missing_after: MissingDataReport,
    pub remediation: Vec<RemediationSummary>,
    pub outliers: CapSummary,
    pub processing_steps: Vec<String>,
    pub duration_ms: u64,
}

/// Cleaned table plus the report describing how it was produced.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub data: DataFrame,
    pub report: PipelineReport,
}
