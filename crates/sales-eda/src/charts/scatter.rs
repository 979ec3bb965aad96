//! Price against rating, on a bounded uniform sample of rows.

use super::{BAR_COLOR, ChartPainter, FONT, PaintError, padded_range};
use crate::error::{EdaError, Result};
use crate::schema::columns;
use crate::utils::numeric_values;
use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::DataFrame;
use rand::prelude::*;

pub const CHART_NAME: &str = "price_vs_rating";

/// Pick `min(max, n)` distinct row indices uniformly without replacement,
/// returned in ascending order.
///
/// Every row is kept when the table is not larger than `max`.
pub fn sample_indices(n: usize, max: usize, seed: Option<u64>) -> Vec<usize> {
    if n <= max {
        return (0..n).collect();
    }
    let population: Vec<usize> = (0..n).collect();
    let mut picked: Vec<usize> = match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            population.choose_multiple(&mut rng, max).copied().collect()
        }
        None => population
            .choose_multiple(&mut thread_rng(), max)
            .copied()
            .collect(),
    };
    picked.sort_unstable();
    picked
}

pub struct PriceRatingChart {
    points: Vec<(f64, f64)>,
}

impl PriceRatingChart {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Sample rows first, then plot the sampled rows that have both values.
    pub fn from_frame(df: &DataFrame, sample_size: usize, seed: Option<u64>) -> Result<Self> {
        let prices = numeric_values(df.column(columns::PRICE)?.as_materialized_series())?;
        let ratings = numeric_values(df.column(columns::RATING)?.as_materialized_series())?;

        let points: Vec<(f64, f64)> = sample_indices(df.height(), sample_size, seed)
            .into_iter()
            .filter_map(|i| Some((prices[i]?, ratings[i]?)))
            .collect();
        if points.is_empty() {
            return Err(EdaError::render(CHART_NAME, "no rows with both price and rating"));
        }
        Ok(Self::new(points))
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }
}

fn axis_range(
    values: impl Iterator<Item = f64>,
) -> std::result::Result<std::ops::Range<f64>, PaintError> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    padded_range(lo, hi, 0.05, 0.5)
}

impl ChartPainter for PriceRatingChart {
    fn file_stem(&self) -> String {
        CHART_NAME.to_string()
    }

    fn size(&self) -> (u32, u32) {
        (1050, 750)
    }

    fn paint<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), PaintError> {
        let x_range = axis_range(self.points.iter().map(|p| p.0))?;
        let y_range = axis_range(self.points.iter().map(|p| p.1))?;

        let mut chart = ChartBuilder::on(root)
            .caption("Price vs Rating", (FONT, 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range, y_range)?;
        chart
            .configure_mesh()
            .x_desc("Price")
            .y_desc("Rating")
            .draw()?;

        chart.draw_series(
            self.points
                .iter()
                .map(|p| Circle::new(*p, 3, BAR_COLOR.mix(0.5).filled())),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::df;
    use std::collections::HashSet;

    #[test]
    fn test_sample_is_bounded_and_unique() {
        let picked = sample_indices(10_000, 2000, None);
        assert_eq!(picked.len(), 2000);
        let unique: HashSet<usize> = picked.iter().copied().collect();
        assert_eq!(unique.len(), 2000);
        assert!(picked.iter().all(|i| *i < 10_000));
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_non_finite_points_are_dropped() {
        let df = df![
            "price" => [9.5, f64::INFINITY, 3.0],
            "rating" => [5.0, 4.0, f64::NAN],
        ]
        .unwrap();
        let chart = PriceRatingChart::from_frame(&df, 2000, Some(1)).unwrap();
        assert_eq!(chart.points(), &[(9.5, 5.0)]);
        assert!(axis_range(chart.points().iter().map(|p| p.0)).is_ok());
        assert!(axis_range([1.0, f64::INFINITY].into_iter()).is_err());
    }

    #[test]
    fn test_small_table_is_kept_whole() {
        assert_eq!(sample_indices(5, 2000, Some(1)), vec![0, 1, 2, 3, 4]);
        assert!(sample_indices(0, 2000, None).is_empty());
    }

    #[test]
    fn test_seeded_sample_is_reproducible() {
        assert_eq!(
            sample_indices(5000, 100, Some(42)),
            sample_indices(5000, 100, Some(42))
        );
    }

    #[test]
    fn test_scatter_plots_at_most_sample_size() {
        let n = 2500;
        let df = df![
            "price" => (0..n).map(|i| i as f64).collect::<Vec<_>>(),
            "rating" => (0..n).map(|i| (i % 5 + 1) as f64).collect::<Vec<_>>(),
        ]
        .unwrap();
        let chart = PriceRatingChart::from_frame(&df, 2000, Some(7)).unwrap();
        assert_eq!(chart.points().len(), 2000);

        let all = PriceRatingChart::from_frame(&df, 5000, None).unwrap();
        assert_eq!(all.points().len(), n);
    }
}
