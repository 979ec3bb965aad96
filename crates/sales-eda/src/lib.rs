//! Sales Dataset EDA Library
//!
//! An exploratory data analysis pipeline for e-commerce order records, built
//! with Polars and plotters.
//!
//! # Overview
//!
//! One run goes through five stages:
//!
//! - **Loading**: CSV with type inference; a missing input halts before any output
//! - **Cleaning**: text trimming and exact-duplicate removal
//! - **Feature Derivation**: date parsing, numeric coercion, derived columns
//!   (`delivery_days`, `review_delay_days`, `review_length`, `price_per_item`)
//!   and median / `"Unknown"` imputation
//! - **Summarizing**: descriptive statistics, correlation matrix, top products by revenue
//! - **Charting**: histograms, heatmap, category bars, rating plots, price vs rating scatter
//!
//! Optional columns gate the steps that need them: a missing column turns a
//! step into an explicit "skipped" outcome rather than an error.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sales_eda::{EdaConfig, ImageFormat, Pipeline};
//!
//! let config = EdaConfig::builder()
//!     .input_path("data/amazon_sales.csv")
//!     .output_dir("outputs")
//!     .image_format(ImageFormat::Png)
//!     .build()?;
//!
//! let report = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! for chart in &report.charts {
//!     println!("{:?}", chart);
//! }
//! ```
//!
//! # Using the stages directly
//!
//! Every stage also works on its own:
//!
//! ```rust,ignore
//! use sales_eda::{DataCleaner, FeatureDeriver, Summarizer, load_dataset};
//!
//! let raw = load_dataset("orders.csv")?;
//! let cleaned = DataCleaner::new().clean(&raw)?;
//! let features = FeatureDeriver::new().derive(&cleaned.df)?;
//! let top = Summarizer::default().top_products(&features.df)?;
//! ```

pub mod charts;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod features;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod schema;
pub mod summary;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use charts::{ChartPainter, Visualizer};
pub use cleaner::{CleaningResult, DataCleaner};
pub use config::{ConfigValidationError, EdaConfig, EdaConfigBuilder, ImageFormat};
pub use error::{EdaError, Result as EdaResult, ResultExt};
pub use features::{FeatureDeriver, FeatureResult};
pub use imputers::{ImputationResult, StatisticalImputer, impute_all};
pub use loader::load_dataset;
pub use pipeline::{
    ClosureProgressReporter, EdaStage, Pipeline, PipelineBuilder, ProgressReporter, ProgressUpdate,
};
pub use reporting::{ReportGenerator, SummaryTables};
pub use schema::{Capabilities, StepOutcome};
pub use summary::Summarizer;
pub use types::{
    ActionType, ArtifactRecord, ChartOutcome, DatasetOverview, EdaAction, EdaReport,
    ImputationMethod, ImputationRecord, MissingCount,
};
pub use utils::{DtypeCategory, get_dtype_category, is_numeric_dtype, parse_numeric_string};
