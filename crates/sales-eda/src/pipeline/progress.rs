//! Progress reporting for the EDA pipeline.
//!
//! The pipeline emits a [`ProgressUpdate`] at every stage boundary and once
//! per chart, so a caller can drive a progress bar or mirror milestones into
//! its own log.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_eda::Pipeline;
//!
//! let report = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of one EDA run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdaStage {
    /// Reading the input file
    Loading,
    /// Trimming text and removing duplicate rows
    Cleaning,
    /// Parsing dates, coercing numerics, deriving columns and imputing
    FeatureDerivation,
    /// Descriptive statistics, correlation and product aggregation
    Summarizing,
    /// Writing derived tables
    Writing,
    /// Rendering charts
    Charting,
    /// Run finished
    Complete,
    /// Run stopped on a fatal error
    Failed,
}

impl EdaStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Dataset",
            Self::Cleaning => "Cleaning Data",
            Self::FeatureDerivation => "Deriving Features",
            Self::Summarizing => "Summarizing",
            Self::Writing => "Writing Tables",
            Self::Charting => "Rendering Charts",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the whole run spent in this stage. Working stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.10,
            Self::Cleaning => 0.10,
            Self::FeatureDerivation => 0.20,
            Self::Summarizing => 0.15,
            Self::Writing => 0.10,
            Self::Charting => 0.35,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Cleaning => 0.10,
            Self::FeatureDerivation => 0.20,
            Self::Summarizing => 0.40,
            Self::Writing => 0.55,
            Self::Charting => 0.65,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// One progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: EdaStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within the current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: EdaStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        let progress = stage.base_progress() + stage.weight() * stage_progress;
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress,
            message: message.into(),
        }
    }

    /// Update for item `current` of `total` within a stage.
    pub fn with_items(
        stage: EdaStage,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let stage_progress = if total > 0 {
            current as f32 / total as f32
        } else {
            0.0
        };
        Self::new(stage, stage_progress, message)
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: EdaStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: EdaStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates from a running pipeline.
///
/// Implementations must be `Send + Sync` so a pipeline can run on a worker
/// thread while reporting to the caller.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
