//! Configuration types for the EDA pipeline.
//!
//! Input and output locations are explicit configuration passed into the
//! pipeline entry point, so a run can target a temporary directory in tests.
//! The builder mirrors the fields one to one and validates on `build()`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Image format used for every chart of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Raster PNG via the bitmap backend
    #[default]
    Png,
    /// Vector SVG
    Svg,
}

impl ImageFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// Configuration for one EDA run.
///
/// Use [`EdaConfig::builder()`] to create a new configuration with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use sales_eda::config::{EdaConfig, ImageFormat};
///
/// let config = EdaConfig::builder()
///     .input_path("data/orders.csv")
///     .output_dir("/tmp/eda")
///     .image_format(ImageFormat::Svg)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdaConfig {
    /// Delimited input file with a header row.
    /// Default: "data/amazon_sales.csv"
    pub input_path: PathBuf,

    /// Root directory for every artifact of the run.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// Chart directory, relative to `output_dir`.
    /// Default: "plots"
    pub plots_subdir: String,

    /// Derived table directory, relative to `output_dir`.
    /// Default: "data"
    pub data_subdir: String,

    /// Image format for charts.
    /// Default: Png
    pub image_format: ImageFormat,

    /// Number of bins in each distribution histogram.
    /// Default: 40
    pub histogram_bins: usize,

    /// Only the first N numeric columns (table order) get a histogram.
    /// Default: 6
    pub max_histograms: usize,

    /// Number of bars in the top categories chart.
    /// Default: 10
    pub top_categories: usize,

    /// Number of rows kept in the top products aggregation.
    /// Default: 20
    pub top_products: usize,

    /// Upper bound on points drawn in the price vs rating scatter.
    /// Default: 2000
    pub scatter_sample_size: usize,

    /// Seed for the scatter sample. `None` draws a fresh sample every run.
    /// Default: None
    pub sample_seed: Option<u64>,

    /// Whether to write `eda_report.json` next to the derived tables.
    /// Default: false
    pub emit_report: bool,
}

impl Default for EdaConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/amazon_sales.csv"),
            output_dir: PathBuf::from("outputs"),
            plots_subdir: "plots".to_string(),
            data_subdir: "data".to_string(),
            image_format: ImageFormat::default(),
            histogram_bins: 40,
            max_histograms: 6,
            top_categories: 10,
            top_products: 20,
            scatter_sample_size: 2000,
            sample_seed: None,
            emit_report: false,
        }
    }
}

impl EdaConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EdaConfigBuilder {
        EdaConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: EdaConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| crate::error::EdaError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Directory holding chart images.
    pub fn plots_dir(&self) -> PathBuf {
        self.output_dir.join(&self.plots_subdir)
    }

    /// Directory holding derived tables.
    pub fn data_dir(&self) -> PathBuf {
        self.output_dir.join(&self.data_subdir)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let counts = [
            ("histogram_bins", self.histogram_bins),
            ("max_histograms", self.max_histograms),
            ("top_categories", self.top_categories),
            ("top_products", self.top_products),
            ("scatter_sample_size", self.scatter_sample_size),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigValidationError::ZeroCount(field.to_string()));
            }
        }

        if self.top_categories > 50 {
            return Err(ConfigValidationError::TooManyCategories(self.top_categories));
        }

        if self.plots_subdir.trim().is_empty() || self.data_subdir.trim().is_empty() {
            return Err(ConfigValidationError::EmptySubdir);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{0}': must be at least 1")]
    ZeroCount(String),

    #[error("Invalid top_categories: {0} (must be at most 50)")]
    TooManyCategories(usize),

    #[error("Output subdirectory names must not be empty")]
    EmptySubdir,
}

/// Builder for [`EdaConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct EdaConfigBuilder {
    input_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    plots_subdir: Option<String>,
    data_subdir: Option<String>,
    image_format: Option<ImageFormat>,
    histogram_bins: Option<usize>,
    max_histograms: Option<usize>,
    top_categories: Option<usize>,
    top_products: Option<usize>,
    scatter_sample_size: Option<usize>,
    sample_seed: Option<u64>,
    emit_report: Option<bool>,
}

impl EdaConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    pub fn from_config(config: &EdaConfig) -> Self {
        Self {
            input_path: Some(config.input_path.clone()),
            output_dir: Some(config.output_dir.clone()),
            plots_subdir: Some(config.plots_subdir.clone()),
            data_subdir: Some(config.data_subdir.clone()),
            image_format: Some(config.image_format),
            histogram_bins: Some(config.histogram_bins),
            max_histograms: Some(config.max_histograms),
            top_categories: Some(config.top_categories),
            top_products: Some(config.top_products),
            scatter_sample_size: Some(config.scatter_sample_size),
            sample_seed: config.sample_seed,
            emit_report: Some(config.emit_report),
        }
    }

    /// Set the input dataset path.
    pub fn input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = Some(path.into());
        self
    }

    /// Set the output root directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the chart and table subdirectory names under the output root.
    pub fn subdirs(mut self, plots: impl Into<String>, data: impl Into<String>) -> Self {
        self.plots_subdir = Some(plots.into());
        self.data_subdir = Some(data.into());
        self
    }

    /// Set the chart image format.
    pub fn image_format(mut self, format: ImageFormat) -> Self {
        self.image_format = Some(format);
        self
    }

    /// Set the number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Set how many numeric columns get a histogram.
    pub fn max_histograms(mut self, count: usize) -> Self {
        self.max_histograms = Some(count);
        self
    }

    /// Set the number of bars in the top categories chart.
    pub fn top_categories(mut self, count: usize) -> Self {
        self.top_categories = Some(count);
        self
    }

    /// Set the number of rows in the top products table.
    pub fn top_products(mut self, count: usize) -> Self {
        self.top_products = Some(count);
        self
    }

    /// Set the scatter sample bound.
    pub fn scatter_sample_size(mut self, size: usize) -> Self {
        self.scatter_sample_size = Some(size);
        self
    }

    /// Seed the scatter sample for reproducible charts.
    pub fn sample_seed(mut self, seed: u64) -> Self {
        self.sample_seed = Some(seed);
        self
    }

    /// Enable or disable the JSON run report.
    pub fn emit_report(mut self, emit: bool) -> Self {
        self.emit_report = Some(emit);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `EdaConfig` or an error if validation fails.
    pub fn build(self) -> Result<EdaConfig, ConfigValidationError> {
        let defaults = EdaConfig::default();
        let config = EdaConfig {
            input_path: self.input_path.unwrap_or(defaults.input_path),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            plots_subdir: self.plots_subdir.unwrap_or(defaults.plots_subdir),
            data_subdir: self.data_subdir.unwrap_or(defaults.data_subdir),
            image_format: self.image_format.unwrap_or_default(),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
            max_histograms: self.max_histograms.unwrap_or(defaults.max_histograms),
            top_categories: self.top_categories.unwrap_or(defaults.top_categories),
            top_products: self.top_products.unwrap_or(defaults.top_products),
            scatter_sample_size: self
                .scatter_sample_size
                .unwrap_or(defaults.scatter_sample_size),
            sample_seed: self.sample_seed,
            emit_report: self.emit_report.unwrap_or(defaults.emit_report),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EdaConfig::default();
        assert_eq!(config.histogram_bins, 40);
        assert_eq!(config.max_histograms, 6);
        assert_eq!(config.top_products, 20);
        assert_eq!(config.scatter_sample_size, 2000);
        assert_eq!(config.image_format, ImageFormat::Png);
        assert!(config.sample_seed.is_none());
    }

    #[test]
    fn test_output_dirs() {
        let config = EdaConfig::builder().output_dir("/tmp/eda").build().unwrap();
        assert_eq!(config.plots_dir(), PathBuf::from("/tmp/eda/plots"));
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/eda/data"));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = EdaConfig::builder()
            .input_path("orders.csv")
            .image_format(ImageFormat::Svg)
            .histogram_bins(20)
            .top_categories(15)
            .sample_seed(7)
            .emit_report(true)
            .build()
            .unwrap();

        assert_eq!(config.input_path, PathBuf::from("orders.csv"));
        assert_eq!(config.image_format.extension(), "svg");
        assert_eq!(config.histogram_bins, 20);
        assert_eq!(config.top_categories, 15);
        assert_eq!(config.sample_seed, Some(7));
        assert!(config.emit_report);
    }

    #[test]
    fn test_validation_zero_bins() {
        let result = EdaConfig::builder().histogram_bins(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::ZeroCount(field) if field == "histogram_bins"
        ));
    }

    #[test]
    fn test_validation_too_many_categories() {
        let result = EdaConfig::builder().top_categories(51).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::TooManyCategories(51)
        ));
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "input_path": "data/orders.csv",
            "image_format": "svg",
            "sample_seed": 42
        }"#;

        let config: EdaConfig = serde_json::from_str(json).expect("Should deserialize");

        assert_eq!(config.input_path, PathBuf::from("data/orders.csv"));
        assert_eq!(config.image_format, ImageFormat::Svg);
        assert_eq!(config.sample_seed, Some(42));
        assert_eq!(config.histogram_bins, 40);
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
    }

    #[test]
    fn test_builder_from_config_keeps_values() {
        let base = EdaConfig::builder().top_products(5).sample_seed(3).build().unwrap();
        let rebuilt = EdaConfigBuilder::from_config(&base)
            .output_dir("elsewhere")
            .build()
            .unwrap();
        assert_eq!(rebuilt.top_products, 5);
        assert_eq!(rebuilt.sample_seed, Some(3));
        assert_eq!(rebuilt.output_dir, PathBuf::from("elsewhere"));
    }
}
