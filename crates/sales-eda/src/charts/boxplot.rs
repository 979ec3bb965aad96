//! Review length by rating, as one box per rating value.

use super::bars::rating_label;
use super::{
    ACCENT_COLOR, BAR_COLOR, ChartPainter, FONT, PaintError, index_label, padded_range,
};
use crate::error::{EdaError, Result};
use crate::schema::columns;
use crate::summary::statistics::{BoxStats, box_stats};
use crate::utils::numeric_values;
use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::DataFrame;

pub const CHART_NAME: &str = "review_length_by_rating";

const HALF_WIDTH: f64 = 0.3;

pub struct ReviewLengthBoxChart {
    /// Ascending by rating.
    groups: Vec<(f64, BoxStats)>,
}

impl ReviewLengthBoxChart {
    /// Group lengths by rating; pairs with a missing side are dropped.
    pub fn new(pairs: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut pairs: Vec<(f64, f64)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut groups = Vec::new();
        let mut start = 0;
        while start < pairs.len() {
            let rating = pairs[start].0;
            let end = pairs[start..]
                .iter()
                .position(|p| p.0 != rating)
                .map_or(pairs.len(), |offset| start + offset);
            let lengths: Vec<f64> = pairs[start..end].iter().map(|p| p.1).collect();
            if let Some(stats) = box_stats(&lengths) {
                groups.push((rating, stats));
            }
            start = end;
        }
        Self { groups }
    }

    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let ratings = numeric_values(df.column(columns::RATING)?.as_materialized_series())?;
        let lengths = numeric_values(df.column(columns::REVIEW_LENGTH)?.as_materialized_series())?;
        let chart = Self::new(
            ratings
                .into_iter()
                .zip(lengths)
                .filter_map(|(r, l)| Some((r?, l?))),
        );
        if chart.groups.is_empty() {
            return Err(EdaError::render(CHART_NAME, "no rows with both rating and review length"));
        }
        Ok(chart)
    }

    pub fn groups(&self) -> &[(f64, BoxStats)] {
        &self.groups
    }
}

impl ChartPainter for ReviewLengthBoxChart {
    fn file_stem(&self) -> String {
        CHART_NAME.to_string()
    }

    fn size(&self) -> (u32, u32) {
        (1200, 750)
    }

    fn paint<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), PaintError> {
        let n = self.groups.len();
        let labels: Vec<String> = self.groups.iter().map(|(r, _)| rating_label(*r)).collect();
        let x_fmt = |v: &f64| index_label(&labels, *v);
        let (lo, hi) = self.groups.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, g| {
            (acc.0.min(g.1.whisker_low), acc.1.max(g.1.whisker_high))
        });
        let y_range = padded_range(lo, hi, 0.05, 1.0)?;

        let mut chart = ChartBuilder::on(root)
            .caption("Review Length by Rating", (FONT, 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..n as f64 - 0.5, y_range)?;
        chart
            .configure_mesh()
            .x_labels(n + 1)
            .x_label_formatter(&x_fmt)
            .x_desc("Rating")
            .y_desc("Review length")
            .draw()?;

        for (i, (_, stats)) in self.groups.iter().enumerate() {
            let x = i as f64;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - HALF_WIDTH, stats.q1), (x + HALF_WIDTH, stats.q3)],
                BAR_COLOR.mix(0.7).filled(),
            )))?;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - HALF_WIDTH, stats.q1), (x + HALF_WIDTH, stats.q3)],
                BLACK.stroke_width(1),
            )))?;

            let median = [(x - HALF_WIDTH, stats.median), (x + HALF_WIDTH, stats.median)];
            chart.draw_series(LineSeries::new(median, ACCENT_COLOR.stroke_width(2)))?;

            let cap = HALF_WIDTH / 2.0;
            let whiskers = [
                vec![(x, stats.q3), (x, stats.whisker_high)],
                vec![(x, stats.q1), (x, stats.whisker_low)],
                vec![(x - cap, stats.whisker_high), (x + cap, stats.whisker_high)],
                vec![(x - cap, stats.whisker_low), (x + cap, stats.whisker_low)],
            ];
            for segment in whiskers {
                chart.draw_series(LineSeries::new(segment, &BLACK))?;
            }
        }
        Ok(())
    }
}
