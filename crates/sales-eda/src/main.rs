//! CLI entry point for the sales dataset EDA pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use sales_eda::{
    ChartOutcome, EdaConfig, EdaConfigBuilder, EdaReport, ImageFormat, Pipeline, StepOutcome,
};
use std::path::PathBuf;
use tracing::{error, info};

/// CLI-compatible image format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliImageFormat {
    /// Raster images
    Png,
    /// Vector images
    Svg,
}

impl From<CliImageFormat> for ImageFormat {
    fn from(cli: CliImageFormat) -> Self {
        match cli {
            CliImageFormat::Png => ImageFormat::Png,
            CliImageFormat::Svg => ImageFormat::Svg,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exploratory data analysis for e-commerce sales records",
    long_about = "Loads a sales CSV, cleans it, derives delivery and review features, \
                  imputes missing values, and writes summary tables and charts.\n\n\
                  EXAMPLES:\n  \
                  # Run with defaults (data/amazon_sales.csv -> outputs/)\n  \
                  sales-eda\n\n  \
                  # Custom input and output, SVG charts\n  \
                  sales-eda -i orders.csv -o results/ --format svg\n\n  \
                  # Reproducible scatter sample and a JSON report\n  \
                  sales-eda -i orders.csv --seed 7 --emit-report"
)]
struct Args {
    /// Path to the sales CSV file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for tables and charts
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file; flags given on the command line override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chart image format
    #[arg(long, value_enum)]
    format: Option<CliImageFormat>,

    /// Bins per distribution histogram
    #[arg(long)]
    bins: Option<usize>,

    /// Number of bars in the top categories chart (1-50)
    #[arg(long)]
    top_categories: Option<usize>,

    /// Maximum number of points in the price vs rating scatter
    #[arg(long)]
    sample_size: Option<usize>,

    /// Seed for the scatter sample
    #[arg(long)]
    seed: Option<u64>,

    /// Write eda_report.json to the output directory
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output the run report as JSON to stdout instead of a summary
    ///
    /// Disables all progress logs.
    #[arg(long)]
    json: bool,

    /// Suppress progress output (only show warnings, errors and the final result)
    #[arg(short, long)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled so stdout
/// only holds the JSON report.
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

/// Merge the config file (if any) with command line overrides.
fn build_config(args: &Args) -> Result<EdaConfig> {
    let base = match &args.config {
        Some(path) => EdaConfig::from_json_file(path)?,
        None => EdaConfig::default(),
    };

    let mut builder = EdaConfigBuilder::from_config(&base);
    if let Some(input) = &args.input {
        builder = builder.input_path(input);
    }
    if let Some(output) = &args.output {
        builder = builder.output_dir(output);
    }
    if let Some(format) = args.format {
        builder = builder.image_format(format.into());
    }
    if let Some(bins) = args.bins {
        builder = builder.histogram_bins(bins);
    }
    if let Some(count) = args.top_categories {
        builder = builder.top_categories(count);
    }
    if let Some(size) = args.sample_size {
        builder = builder.scatter_sample_size(size);
    }
    if let Some(seed) = args.seed {
        builder = builder.sample_seed(seed);
    }
    if args.emit_report {
        builder = builder.emit_report(true);
    }

    Ok(builder.build()?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;

    let mut builder = Pipeline::builder().config(config.clone());
    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }
    let pipeline = builder.build()?;

    match pipeline.run() {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_human_readable_summary(&report, &config);
            }
            Ok(())
        }
        Err(e) => {
            if args.json {
                println!("{}", serde_json::json!({ "error": e }));
            }
            if e.is_dataset_not_found() {
                error!("Input file not found: {}", config.input_path.display());
                return Err(anyhow!(
                    "Input file not found: {} (nothing was written)",
                    config.input_path.display()
                ));
            }
            Err(anyhow!("EDA run failed: {}", e))
        }
    }
}

/// Print a short run summary.
///
/// Uses `println!` on purpose: this is the command's result, not a log line,
/// and must show regardless of the log level.
fn print_human_readable_summary(report: &EdaReport, config: &EdaConfig) {
    println!();
    println!("{}", "=".repeat(80));
    println!("EDA COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_path.display(),
        report.overview.rows,
        report.overview.columns
    );
    println!("Output: {}", config.output_dir.display());
    println!();

    println!("Processing Summary:");
    println!("  Duration: {}ms", report.duration_ms);
    println!(
        "  Rows after cleaning: {} ({} duplicates removed)",
        report.rows_after_cleaning, report.duplicates_removed
    );
    println!("  Columns imputed: {}", report.imputations.len());
    println!();

    if !report.steps.is_empty() {
        println!("Derived Steps:");
        for step in &report.steps {
            match step {
                StepOutcome::Applied { step, detail } => println!("  + {}: {}", step, detail),
                StepOutcome::Skipped {
                    step,
                    missing_columns,
                } => println!("  - {} skipped (missing {})", step, missing_columns.join(", ")),
            }
        }
        println!();
    }

    println!("Tables:");
    for table in &report.tables {
        println!("  {} ({} rows)", table.path.display(), table.rows);
    }
    println!();

    println!(
        "Charts: {} written, {} failed",
        report.charts_written(),
        report.charts_failed()
    );
    for chart in &report.charts {
        match chart {
            ChartOutcome::Written { path, .. } => println!("  {}", path.display()),
            ChartOutcome::Skipped {
                chart,
                missing_columns,
            } => {
                let missing = if missing_columns.is_empty() {
                    "not enough numeric columns".to_string()
                } else {
                    format!("missing {}", missing_columns.join(", "))
                };
                println!("  {} skipped ({})", chart, missing);
            }
            ChartOutcome::Failed { chart, reason } => println!("  {} FAILED: {}", chart, reason),
        }
    }
    println!();

    if !report.warnings.is_empty() {
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save the JSON report");
    println!("{}", "=".repeat(80));
}
