//! Distribution histogram with a density overlay.

use super::{ACCENT_COLOR, BAR_COLOR, ChartPainter, FONT, PaintError};
use crate::error::{EdaError, Result};
use crate::summary::statistics::{Histogram, gaussian_kde, histogram};
use crate::utils::{present_values, sanitize_file_stem};
use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::DataFrame;

/// Points along the x axis at which the density curve is evaluated.
const KDE_POINTS: usize = 200;

pub struct HistogramChart {
    column: String,
    hist: Histogram,
    /// Density scaled to bar counts.
    kde: Option<Vec<(f64, f64)>>,
}

impl HistogramChart {
    pub fn stem_for(column: &str) -> String {
        format!("{}_distribution", sanitize_file_stem(column))
    }

    pub fn new(column: &str, values: &[f64], bins: usize) -> Option<Self> {
        let hist = histogram(values, bins)?;
        let (lo, hi) = (hist.edges[0], hist.edges[hist.edges.len() - 1]);
        let step = (hi - lo) / (KDE_POINTS - 1) as f64;
        let grid: Vec<f64> = (0..KDE_POINTS).map(|i| lo + step * i as f64).collect();

        let scale = values.len() as f64 * hist.bin_width();
        let kde = gaussian_kde(values, &grid)
            .map(|density| grid.iter().zip(density).map(|(x, d)| (*x, d * scale)).collect());

        Some(Self {
            column: column.to_string(),
            hist,
            kde,
        })
    }

    pub fn from_frame(df: &DataFrame, column: &str, bins: usize) -> Result<Self> {
        let values = present_values(df.column(column)?.as_materialized_series())?;
        Self::new(column, &values, bins)
            .ok_or_else(|| EdaError::render(Self::stem_for(column), "column has no values"))
    }

    pub fn counts(&self) -> &[usize] {
        &self.hist.counts
    }
}

impl ChartPainter for HistogramChart {
    fn file_stem(&self) -> String {
        Self::stem_for(&self.column)
    }

    fn size(&self) -> (u32, u32) {
        (1050, 600)
    }

    fn paint<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), PaintError> {
        let edges = &self.hist.edges;
        let (lo, hi) = (edges[0], edges[edges.len() - 1]);
        let kde_peak = self
            .kde
            .as_ref()
            .map(|pts| pts.iter().fold(0.0f64, |m, p| m.max(p.1)))
            .unwrap_or(0.0);
        let y_max = (self.hist.max_count() as f64).max(kde_peak).max(1.0) * 1.1;

        let mut chart = ChartBuilder::on(root)
            .caption(format!("Distribution of {}", self.column), (FONT, 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(lo..hi, 0f64..y_max)?;
        chart
            .configure_mesh()
            .x_desc(self.column.as_str())
            .y_desc("Count")
            .draw()?;

        chart.draw_series(self.hist.counts.iter().enumerate().map(|(i, count)| {
            Rectangle::new(
                [(edges[i], 0.0), (edges[i + 1], *count as f64)],
                BAR_COLOR.mix(0.8).filled(),
            )
        }))?;

        if let Some(points) = &self.kde {
            chart.draw_series(LineSeries::new(
                points.iter().copied(),
                ACCENT_COLOR.stroke_width(2),
            ))?;
        }
        Ok(())
    }
}
