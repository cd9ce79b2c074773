//! CLI entry point for the ingestion and cleaning pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use lex_ingest::{
    CleaningPlan, DEFAULT_DESTINATION_DIRECTORY, MissingDataReport, MissingSeverity, Pipeline,
    PipelineConfig, PipelineReport, load_data, missing_data_summary,
};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Archived dataset ingestion and cleaning pipeline",
    long_about = "Extracts a (possibly nested) zip archive, loads a pipe-delimited table from it, \
                  then remediates missing data and caps outliers.\n\n\
                  EXAMPLES:\n  \
                  # Show the missing-data summary only\n  \
                  lex-ingest -a raw/insurance.zip -f data.txt --summary-only\n\n  \
                  # Drop one column, impute two, cap premiums\n  \
                  lex-ingest -a raw/insurance.zip -f data.txt \\\n    \
                  --high NumberOfVehiclesInFleet --moderate Bank,AccountType --cap TotalPremium\n\n  \
                  # Machine-readable report\n  \
                  lex-ingest -a raw/insurance.zip -f data.txt --moderate Gender --json | jq .outliers"
)]
struct Args {
    /// Path to the outer zip archive
    #[arg(short, long)]
    archive: PathBuf,

    /// Name of the pipe-delimited file inside the archive
    #[arg(short, long)]
    file: String,

    /// Directory the archive is extracted into
    #[arg(short, long, default_value = DEFAULT_DESTINATION_DIRECTORY)]
    dest: PathBuf,

    /// Columns to drop (comma-separated)
    #[arg(long, value_delimiter = ',')]
    high: Vec<String>,

    /// Columns to impute with median or mode (comma-separated)
    #[arg(long, value_delimiter = ',')]
    moderate: Vec<String>,

    /// Columns given without a severity; imputed like --moderate (comma-separated)
    #[arg(long = "default", value_delimiter = ',')]
    default_tier: Vec<String>,

    /// Numeric columns to cap at their IQR bounds (comma-separated)
    #[arg(long, value_delimiter = ',')]
    cap: Vec<String>,

    /// IQR multiplier used for outlier bounds
    #[arg(long, default_value = "1.5")]
    iqr_multiplier: f64,

    /// Only load the table and print its missing-data summary
    #[arg(long)]
    summary_only: bool,

    /// Write the cleaned table as pipe-delimited text to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !args.archive.exists() {
        return Err(anyhow!("Archive not found: {}", args.archive.display()));
    }

    let config = PipelineConfig::builder()
        .destination_directory(&args.dest)
        .iqr_multiplier(args.iqr_multiplier)
        .build()?;

    if args.summary_only {
        return run_summary(&args, &config);
    }

    let plan = CleaningPlan::new()
        .with_tier(MissingSeverity::High, args.high.iter().cloned())
        .with_tier(MissingSeverity::Moderate, args.moderate.iter().cloned())
        .with_tier(MissingSeverity::Default, args.default_tier.iter().cloned())
        .with_cap_columns(args.cap.iter().cloned());

    let pipeline = Pipeline::builder().config(config).plan(plan).build()?;

    info!("{}", "=".repeat(80));
    info!("Starting ingestion pipeline...");
    info!("{}", "=".repeat(80));

    let mut result = pipeline
        .run(&args.archive, &args.file)
        .inspect_err(|e| error!("Pipeline failed: {}", e))?;

    if let Some(ref output) = args.output {
        write_table(&mut result.data, output)?;
        info!("Cleaned table written to: {}", output.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.report)?);
    } else {
        print_human_readable_summary(&result.report, &args);
    }
    Ok(())
}

/// Load the table and report its missing data without changing anything.
fn run_summary(args: &Args, config: &PipelineConfig) -> Result<()> {
    let df = load_data(&args.archive, &args.file, config)?;
    let report = missing_data_summary(&df);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{} rows x {} columns", df.height(), df.width());
        print_missing_report(&report);
    }
    Ok(())
}

/// Write `df` as pipe-delimited text with a header row.
fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b'|')
        .finish(df)?;
    Ok(())
}

fn print_missing_report(report: &MissingDataReport) {
    if report.is_empty() {
        println!("  No missing values");
        return;
    }
    println!("{:<32} {:>12} {:>10}", "Column", "Missing", "Missing %");
    println!("{}", "-".repeat(56));
    for col in &report.columns {
        println!(
            "{:<32} {:>12} {:>10.2}",
            truncate_str(&col.column, 31),
            col.missing_count,
            col.missing_percentage
        );
    }
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a human-readable summary of the run.
///
/// This is the default output when `--json` is not given.
fn print_human_readable_summary(report: &PipelineReport, args: &Args) {
    println!();
    println!("{}", "=".repeat(80));
    println!("INGESTION COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Archive: {}", args.archive.display());
    if let Some(ref extraction) = report.extraction {
        println!(
            "  Extracted {} files to {} (nested archives: {}, max depth: {})",
            extraction.file_count(),
            extraction.destination.display(),
            extraction.nested_archives,
            extraction.max_depth
        );
    }
    println!(
        "Table:   {} ({} rows x {} columns -> {} rows x {} columns)",
        args.file,
        report.shape_before.0,
        report.shape_before.1,
        report.shape_after.0,
        report.shape_after.1
    );
    if let Some(ref output) = args.output {
        println!("Output:  {}", output.display());
    }
    println!("Duration: {}ms", report.duration_ms);
    println!();

    println!("Missing data before cleaning:");
    print_missing_report(&report.missing_before);
    println!();

    if !report.processing_steps.is_empty() {
        println!("Actions Taken:");
        for step in &report.processing_steps {
            println!("  - {}", step);
        }
        println!();
    }

    println!("Missing data after cleaning:");
    print_missing_report(&report.missing_after);
    println!();

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
