//! Frequency bar charts: top categories and rating counts.

use super::{BAR_COLOR, ChartPainter, FONT, PaintError, index_label};
use crate::error::{EdaError, Result};
use crate::schema::columns;
use crate::utils::numeric_values;
use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::{DataFrame, DataType};
use std::collections::HashMap;

pub const TOP_CATEGORIES: &str = "top_categories";
pub const RATING_COUNTS: &str = "rating_counts";

/// Horizontal bars of the most frequent categories, most frequent on top.
pub struct TopCategoriesChart {
    /// Sorted by count descending, then by name.
    counts: Vec<(String, usize)>,
}

impl TopCategoriesChart {
    pub fn new(values: impl IntoIterator<Item = String>, limit: usize) -> Self {
        let mut tally: HashMap<String, usize> = HashMap::new();
        for value in values {
            *tally.entry(value).or_insert(0) += 1;
        }
        let mut counts: Vec<(String, usize)> = tally.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(limit);
        Self { counts }
    }

    pub fn from_frame(df: &DataFrame, limit: usize) -> Result<Self> {
        let text = df
            .column(columns::CATEGORY)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let values: Vec<String> = text.str()?.into_iter().flatten().map(String::from).collect();
        if values.is_empty() {
            return Err(EdaError::render(TOP_CATEGORIES, "no category values"));
        }
        Ok(Self::new(values, limit))
    }

    pub fn counts(&self) -> &[(String, usize)] {
        &self.counts
    }
}

impl ChartPainter for TopCategoriesChart {
    fn file_stem(&self) -> String {
        TOP_CATEGORIES.to_string()
    }

    fn size(&self) -> (u32, u32) {
        (1200, 750)
    }

    fn paint<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), PaintError> {
        let n = self.counts.len();
        // bottom-up, so the largest bar sits at the top
        let labels: Vec<String> = self.counts.iter().rev().map(|(name, _)| name.clone()).collect();
        let y_fmt = |v: &f64| index_label(&labels, *v);
        let x_max = self.counts.first().map(|c| c.1).unwrap_or(1).max(1) as f64 * 1.1;

        let mut chart = ChartBuilder::on(root)
            .caption(format!("Top {} Categories", n), (FONT, 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(180)
            .build_cartesian_2d(0f64..x_max, -0.5..n as f64 - 0.5)?;
        chart
            .configure_mesh()
            .y_labels(n + 1)
            .y_label_formatter(&y_fmt)
            .x_desc("Count")
            .draw()?;

        chart.draw_series(self.counts.iter().rev().enumerate().map(|(i, (_, count))| {
            let y = i as f64;
            Rectangle::new(
                [(0.0, y - 0.4), (*count as f64, y + 0.4)],
                BAR_COLOR.mix(0.9).filled(),
            )
        }))?;
        Ok(())
    }
}

/// One bar per distinct rating value.
pub struct RatingCountChart {
    /// Ascending by rating.
    counts: Vec<(f64, usize)>,
}

impl RatingCountChart {
    pub fn new(ratings: &[f64]) -> Self {
        let mut sorted = ratings.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut counts: Vec<(f64, usize)> = Vec::new();
        for r in sorted {
            match counts.last_mut() {
                Some((last, count)) if *last == r => *count += 1,
                _ => counts.push((r, 1)),
            }
        }
        Self { counts }
    }

    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let ratings: Vec<f64> =
            numeric_values(df.column(columns::RATING)?.as_materialized_series())?
                .into_iter()
                .flatten()
                .collect();
        if ratings.is_empty() {
            return Err(EdaError::render(RATING_COUNTS, "no rating values"));
        }
        Ok(Self::new(&ratings))
    }

    pub fn counts(&self) -> &[(f64, usize)] {
        &self.counts
    }
}

/// `4` rather than `4.0`; fractional ratings keep their decimals.
pub(crate) fn rating_label(r: f64) -> String {
    if r.fract() == 0.0 {
        format!("{:.0}", r)
    } else {
        format!("{}", r)
    }
}

impl ChartPainter for RatingCountChart {
    fn file_stem(&self) -> String {
        RATING_COUNTS.to_string()
    }

    fn size(&self) -> (u32, u32) {
        (1050, 600)
    }

    fn paint<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), PaintError> {
        let n = self.counts.len();
        let labels: Vec<String> = self.counts.iter().map(|(r, _)| rating_label(*r)).collect();
        let x_fmt = |v: &f64| index_label(&labels, *v);
        let y_max = self.counts.iter().map(|c| c.1).max().unwrap_or(1) as f64 * 1.1;

        let mut chart = ChartBuilder::on(root)
            .caption("Rating Counts", (FONT, 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..n as f64 - 0.5, 0f64..y_max)?;
        chart
            .configure_mesh()
            .x_labels(n + 1)
            .x_label_formatter(&x_fmt)
            .x_desc("Rating")
            .y_desc("Count")
            .draw()?;

        chart.draw_series(self.counts.iter().enumerate().map(|(i, (_, count))| {
            let x = i as f64;
            Rectangle::new(
                [(x - 0.4, 0.0), (x + 0.4, *count as f64)],
                BAR_COLOR.mix(0.9).filled(),
            )
        }))?;
        Ok(())
    }
}
