//! Chart rendering.
//!
//! The [`Visualizer`] renders a fixed, ordered set of charts from the final
//! table. Every chart is gated on its columns and isolated from the others:
//! a chart that cannot be drawn is reported as [`ChartOutcome::Failed`] and
//! the next one still runs.
//!
//! Each chart is a [`ChartPainter`], generic over the plotters backend so the
//! same drawing code produces PNG or SVG. Images are drawn into a hidden
//! `.partial` sibling and renamed into place once complete.

pub mod bars;
pub mod boxplot;
pub mod heatmap;
pub mod histogram;
pub mod scatter;

use crate::config::{EdaConfig, ImageFormat};
use crate::error::{EdaError, Result};
use crate::loader::ensure_dir;
use crate::schema::{Capabilities, StepOutcome, columns};
use crate::types::ChartOutcome;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use polars::prelude::DataFrame;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub use scatter::sample_indices;

/// Bar fill shared by every chart.
pub(crate) const BAR_COLOR: RGBColor = RGBColor(76, 114, 176);
/// Secondary color for overlays (density curve, medians).
pub(crate) const ACCENT_COLOR: RGBColor = RGBColor(221, 132, 82);

pub(crate) const FONT: &str = "sans-serif";

/// A drawing failure inside a painter.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct PaintError(String);

impl PaintError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PaintError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        Self(e.to_string())
    }
}

/// One chart, drawable on any plotters backend.
pub trait ChartPainter {
    /// File name without extension.
    fn file_stem(&self) -> String;

    /// Image size in pixels.
    fn size(&self) -> (u32, u32);

    /// Draw onto a root area that has already been cleared.
    fn paint<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), PaintError>;
}

/// Axis range over `lo..hi`, widened by `frac` of the span and at least
/// `min_pad` on each side. Fails when the bounds are not finite.
pub(crate) fn padded_range(
    lo: f64,
    hi: f64,
    frac: f64,
    min_pad: f64,
) -> std::result::Result<Range<f64>, PaintError> {
    let pad = ((hi - lo) * frac).max(min_pad);
    let (start, end) = (lo - pad, hi + pad);
    if !start.is_finite() || !end.is_finite() || start >= end {
        return Err(PaintError::new(format!("unbounded axis range {}..{}", lo, hi)));
    }
    Ok(start..end)
}

/// Label for a categorical axis whose categories sit at integer positions.
pub(crate) fn index_label(labels: &[String], v: f64) -> String {
    let idx = v.round();
    if (v - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

fn draw<DB: DrawingBackend, P: ChartPainter>(
    painter: &P,
    root: DrawingArea<DB, Shift>,
) -> std::result::Result<(), PaintError> {
    root.fill(&WHITE)?;
    painter.paint(&root)?;
    root.present()?;
    Ok(())
}

/// Draw a chart into `dir` and return the written path.
///
/// The drawing area is dropped before this returns, whether or not drawing
/// succeeded. A failed chart leaves no partial file behind.
pub fn render<P: ChartPainter>(painter: &P, dir: &Path, format: ImageFormat) -> Result<PathBuf> {
    let stem = painter.file_stem();
    let ext = format.extension();
    let final_path = dir.join(format!("{}.{}", stem, ext));
    let partial_path = dir.join(format!(".{}.partial.{}", stem, ext));

    ensure_dir(dir)?;

    let drawn = match format {
        ImageFormat::Png => draw(
            painter,
            BitMapBackend::new(&partial_path, painter.size()).into_drawing_area(),
        ),
        ImageFormat::Svg => draw(
            painter,
            SVGBackend::new(&partial_path, painter.size()).into_drawing_area(),
        ),
    };

    if let Err(e) = drawn {
        let _ = fs::remove_file(&partial_path);
        return Err(EdaError::render(&stem, e));
    }

    fs::rename(&partial_path, &final_path).map_err(|e| {
        let _ = fs::remove_file(&partial_path);
        EdaError::write_failed(&final_path, e)
    })?;
    Ok(final_path)
}

/// Renders the chart set of a run.
#[derive(Debug, Clone)]
pub struct Visualizer {
    plots_dir: PathBuf,
    format: ImageFormat,
    histogram_bins: usize,
    max_histograms: usize,
    top_categories: usize,
    scatter_sample_size: usize,
    sample_seed: Option<u64>,
}

impl Visualizer {
    pub fn new(config: &EdaConfig) -> Self {
        Self {
            plots_dir: config.plots_dir(),
            format: config.image_format,
            histogram_bins: config.histogram_bins,
            max_histograms: config.max_histograms,
            top_categories: config.top_categories,
            scatter_sample_size: config.scatter_sample_size,
            sample_seed: config.sample_seed,
        }
    }

    /// Render every chart in order. Only a missing plots directory is fatal.
    pub fn render_all(&self, df: &DataFrame) -> Result<Vec<ChartOutcome>> {
        ensure_dir(&self.plots_dir)?;

        let mut outcomes = self.histograms(df);
        outcomes.push(self.correlation_heatmap(df));
        outcomes.push(self.top_categories(df));
        outcomes.push(self.rating_counts(df));
        outcomes.push(self.review_length_by_rating(df));
        outcomes.push(self.price_vs_rating(df));

        for outcome in &outcomes {
            match outcome {
                ChartOutcome::Written { path, .. } => info!("Chart written: {}", path.display()),
                ChartOutcome::Skipped {
                    chart,
                    missing_columns,
                } => info!("Chart '{}' skipped: missing {:?}", chart, missing_columns),
                ChartOutcome::Failed { chart, reason } => {
                    warn!("Chart '{}' failed: {}", chart, reason)
                }
            }
        }
        Ok(outcomes)
    }

    /// Render one painter, turning any error into a `Failed` outcome.
    fn finish<P: ChartPainter>(&self, chart: &str, painter: Result<P>) -> ChartOutcome {
        let result = painter.and_then(|p| render(&p, &self.plots_dir, self.format));
        match result {
            Ok(path) => ChartOutcome::Written {
                chart: chart.to_string(),
                path,
            },
            Err(e) => ChartOutcome::Failed {
                chart: chart.to_string(),
                reason: e.to_string(),
            },
        }
    }

    fn skipped(chart: &str, missing_columns: Vec<String>) -> ChartOutcome {
        ChartOutcome::Skipped {
            chart: chart.to_string(),
            missing_columns,
        }
    }

    fn histograms(&self, df: &DataFrame) -> Vec<ChartOutcome> {
        let numeric = Capabilities::of(df).numeric_columns();
        if numeric.is_empty() {
            return vec![Self::skipped("histograms", Vec::new())];
        }

        numeric
            .iter()
            .take(self.max_histograms)
            .map(|name| {
                let painter = histogram::HistogramChart::from_frame(df, name, self.histogram_bins);
                let stem = histogram::HistogramChart::stem_for(name);
                self.finish(&stem, painter)
            })
            .collect()
    }

    fn correlation_heatmap(&self, df: &DataFrame) -> ChartOutcome {
        let chart = heatmap::CHART_NAME;
        if Capabilities::of(df).numeric_columns().len() < 2 {
            return Self::skipped(chart, Vec::new());
        }
        self.finish(chart, heatmap::HeatmapChart::from_frame(df))
    }

    fn top_categories(&self, df: &DataFrame) -> ChartOutcome {
        let chart = bars::TOP_CATEGORIES;
        if let Err(skip) = Capabilities::of(df).require(chart, &[columns::CATEGORY]) {
            return Self::skipped(chart, skipped_columns(skip));
        }
        self.finish(chart, bars::TopCategoriesChart::from_frame(df, self.top_categories))
    }

    fn rating_counts(&self, df: &DataFrame) -> ChartOutcome {
        let chart = bars::RATING_COUNTS;
        if let Err(skip) = Capabilities::of(df).require(chart, &[columns::RATING]) {
            return Self::skipped(chart, skipped_columns(skip));
        }
        self.finish(chart, bars::RatingCountChart::from_frame(df))
    }

    fn review_length_by_rating(&self, df: &DataFrame) -> ChartOutcome {
        let chart = boxplot::CHART_NAME;
        if let Err(skip) =
            Capabilities::of(df).require(chart, &[columns::RATING, columns::REVIEW_LENGTH])
        {
            return Self::skipped(chart, skipped_columns(skip));
        }
        self.finish(chart, boxplot::ReviewLengthBoxChart::from_frame(df))
    }

    fn price_vs_rating(&self, df: &DataFrame) -> ChartOutcome {
        let chart = scatter::CHART_NAME;
        if let Err(skip) = Capabilities::of(df).require(chart, &[columns::PRICE, columns::RATING]) {
            return Self::skipped(chart, skipped_columns(skip));
        }
        self.finish(
            chart,
            scatter::PriceRatingChart::from_frame(df, self.scatter_sample_size, self.sample_seed),
        )
    }
}

fn skipped_columns(outcome: StepOutcome) -> Vec<String> {
    match outcome {
        StepOutcome::Skipped {
            missing_columns, ..
        } => missing_columns,
        StepOutcome::Applied { .. } => Vec::new(),
    }
}
