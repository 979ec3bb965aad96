//! Main EDA pipeline.
//!
//! This module provides the `Pipeline` struct and its builder, which run
//! the stages in order: load, clean, derive features, summarize, write
//! tables, render charts.

use crate::charts::Visualizer;
use crate::cleaner::DataCleaner;
use crate::config::{ConfigValidationError, EdaConfig};
use crate::error::{Result, ResultExt};
use crate::features::FeatureDeriver;
use crate::loader::{load_dataset, log_overview, overview};
use crate::pipeline::progress::{
    ClosureProgressReporter, EdaStage, ProgressReporter, ProgressUpdate,
};
use crate::reporting::{ReportGenerator, SummaryTables};
use crate::schema::{Capabilities, StepOutcome, columns};
use crate::summary::Summarizer;
use crate::types::{ChartOutcome, EdaReport};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

const TOP_PRODUCTS_STEP: &str = "top_products";

/// The EDA pipeline.
///
/// Use [`Pipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use sales_eda::{EdaConfig, Pipeline};
///
/// let report = Pipeline::builder()
///     .config(EdaConfig::builder().input_path("orders.csv").build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
///
/// println!("{} charts written", report.charts_written());
/// ```
pub struct Pipeline {
    config: EdaConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: DataCleaner,
    deriver: FeatureDeriver,
    summarizer: Summarizer,
    visualizer: Visualizer,
    reporter: ReportGenerator,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &EdaConfig {
        &self.config
    }

    /// Run every stage against the configured input.
    ///
    /// # Errors
    ///
    /// Returns [`EdaError::DatasetNotFound`](crate::EdaError::DatasetNotFound)
    /// before anything is written when the input is missing, and
    /// `OutputWriteFailed` when a derived table cannot be written. Chart
    /// failures are recorded in the report instead.
    pub fn run(&self) -> Result<EdaReport> {
        match self.run_internal() {
            Ok(report) => {
                self.report_progress(ProgressUpdate::complete("EDA run completed"));
                Ok(report)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn run_internal(&self) -> Result<EdaReport> {
        let start_time = Instant::now();
        let mut report = EdaReport::new(&self.config.input_path);

        // Step 1: Load
        self.report_progress(ProgressUpdate::new(EdaStage::Loading, 0.0, "Loading dataset..."));
        let raw = load_dataset(&self.config.input_path)?;
        log_overview(&raw);
        report.overview = overview(&raw);
        self.report_progress(ProgressUpdate::new(
            EdaStage::Loading,
            1.0,
            format!("Loaded {} rows x {} columns", raw.height(), raw.width()),
        ));

        // Step 2: Clean
        self.report_progress(ProgressUpdate::new(EdaStage::Cleaning, 0.0, "Cleaning..."));
        let cleaned = self.cleaner.clean(&raw).context("Cleaning")?;
        drop(raw);
        report.rows_after_cleaning = cleaned.df.height();
        report.duplicates_removed = cleaned.duplicates_removed;
        report.actions.extend(cleaned.actions);
        self.report_progress(ProgressUpdate::new(
            EdaStage::Cleaning,
            1.0,
            format!("Removed {} duplicate rows", cleaned.duplicates_removed),
        ));

        // Step 3: Derive features and impute
        self.report_progress(ProgressUpdate::new(
            EdaStage::FeatureDerivation,
            0.0,
            "Deriving features...",
        ));
        let features = self
            .deriver
            .derive(&cleaned.df)
            .context("Feature derivation")?;
        for step in &features.steps {
            match step {
                StepOutcome::Applied { step, detail } => info!("Step '{}': {}", step, detail),
                StepOutcome::Skipped {
                    step,
                    missing_columns,
                } => info!("Step '{}' skipped: missing {:?}", step, missing_columns),
            }
        }
        report.actions.extend(features.actions);
        report.steps = features.steps;
        report.missing_values = features.missing_before_imputation;
        report.imputations = features.imputations;
        report.warnings.extend(features.warnings);
        let df = features.df;
        info!(
            "Feature derivation complete: {} rows x {} columns",
            df.height(),
            df.width()
        );
        self.report_progress(ProgressUpdate::new(
            EdaStage::FeatureDerivation,
            1.0,
            "Features derived and nulls imputed",
        ));

        // Step 4: Summarize
        self.report_progress(ProgressUpdate::new(EdaStage::Summarizing, 0.0, "Summarizing..."));
        let description = self.summarizer.describe(&df).context("Describing columns")?;
        let correlation = self
            .summarizer
            .correlation(&df)
            .context("Correlation matrix")?;
        let top_products = match Capabilities::of(&df)
            .require(TOP_PRODUCTS_STEP, &[columns::PRODUCT_ID, columns::TOTAL_AMOUNT])
        {
            Ok(()) => {
                let table = self
                    .summarizer
                    .top_products(&df)
                    .context("Top products")?;
                if let Some(table) = &table {
                    report.steps.push(StepOutcome::applied(
                        TOP_PRODUCTS_STEP,
                        format!("{} products ranked by revenue", table.height()),
                    ));
                }
                table
            }
            Err(skipped) => {
                info!("Top products skipped: {:?}", skipped);
                report.steps.push(skipped);
                None
            }
        };
        self.report_progress(ProgressUpdate::new(EdaStage::Summarizing, 1.0, "Summary ready"));

        // Step 5: Write tables
        self.report_progress(ProgressUpdate::new(EdaStage::Writing, 0.0, "Writing tables..."));
        let summary = SummaryTables {
            description,
            correlation,
            top_products,
        };
        report.tables = self.reporter.write_tables(&df, &summary)?;
        self.report_progress(ProgressUpdate::new(
            EdaStage::Writing,
            1.0,
            format!("Wrote {} tables", report.tables.len()),
        ));

        // Step 6: Charts
        self.report_progress(ProgressUpdate::new(EdaStage::Charting, 0.0, "Rendering charts..."));
        let charts = self.visualizer.render_all(&df)?;
        let total = charts.len();
        for (i, outcome) in charts.iter().enumerate() {
            if let ChartOutcome::Failed { chart, reason } = outcome {
                report.add_warning(format!("Chart '{}' failed: {}", chart, reason));
            }
            self.report_progress(ProgressUpdate::with_items(
                EdaStage::Charting,
                i + 1,
                total,
                format!("Chart '{}' done", outcome.chart()),
            ));
        }
        report.charts = charts;

        report.duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "EDA complete in {} ms: {} tables, {} charts written, {} failed",
            report.duration_ms,
            report.tables.len(),
            report.charts_written(),
            report.charts_failed()
        );

        if self.config.emit_report {
            self.reporter.write_report(&report)?;
        }

        Ok(report)
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<EdaConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the run configuration.
    pub fn config(mut self, config: EdaConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during the run.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// For anything more involved, use
    /// [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            summarizer: Summarizer::new(config.top_products),
            visualizer: Visualizer::new(&config),
            reporter: ReportGenerator::new(&config),
            cleaner: DataCleaner::new(),
            deriver: FeatureDeriver::new(),
            progress_reporter: self.progress_reporter,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config().histogram_bins, 40);
        assert!(pipeline.progress_reporter.is_none());
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = EdaConfig {
            histogram_bins: 0,
            ..EdaConfig::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_missing_input_reports_failure_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out");
        let config = EdaConfig::builder()
            .input_path(dir.path().join("missing.csv"))
            .output_dir(&output)
            .build()
            .unwrap();

        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = stages.clone();
        let pipeline = Pipeline::builder()
            .config(config)
            .on_progress(move |update| seen.lock().unwrap().push(update.stage))
            .build()
            .unwrap();

        let err = pipeline.run().unwrap_err();
        assert!(err.is_dataset_not_found());
        assert!(!output.exists());
        assert_eq!(
            *stages.lock().unwrap(),
            vec![EdaStage::Loading, EdaStage::Failed]
        );
    }
}
