//! Annotated correlation heatmap.

use super::{ChartPainter, FONT, PaintError, index_label};
use crate::error::{EdaError, Result};
use crate::summary::statistics::pearson;
use crate::utils::numeric_values;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use polars::prelude::DataFrame;

pub const CHART_NAME: &str = "correlation_heatmap";

/// Cell color for an undefined correlation.
const UNDEFINED: RGBColor = RGBColor(230, 230, 230);

pub struct HeatmapChart {
    labels: Vec<String>,
    /// `matrix[i][j]` is the correlation of `labels[i]` with `labels[j]`.
    matrix: Vec<Vec<Option<f64>>>,
}

impl HeatmapChart {
    pub fn new(labels: Vec<String>, matrix: Vec<Vec<Option<f64>>>) -> Self {
        Self { labels, matrix }
    }

    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let labels = crate::schema::Capabilities::of(df).numeric_columns();
        if labels.len() < 2 {
            return Err(EdaError::render(CHART_NAME, "fewer than two numeric columns"));
        }

        let values: Vec<Vec<Option<f64>>> = labels
            .iter()
            .map(|name| Ok(numeric_values(df.column(name)?.as_materialized_series())?))
            .collect::<Result<_>>()?;

        let matrix = (0..labels.len())
            .map(|i| {
                (0..labels.len())
                    .map(|j| {
                        let r = pearson(&values[i], &values[j]);
                        if i == j { r.map(|_| 1.0) } else { r }
                    })
                    .collect()
            })
            .collect();

        Ok(Self::new(labels, matrix))
    }
}

/// Diverging blue-white-red scale over `[-1, 1]`.
pub fn coolwarm(r: f64) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let r = r.clamp(-1.0, 1.0);
    let (from, to, t) = if r < 0.0 {
        (COLD, MID, r + 1.0)
    } else {
        (MID, WARM, r)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

impl ChartPainter for HeatmapChart {
    fn file_stem(&self) -> String {
        CHART_NAME.to_string()
    }

    fn size(&self) -> (u32, u32) {
        (1500, 1200)
    }

    fn paint<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> std::result::Result<(), PaintError> {
        let n = self.labels.len();
        let extent = n as f64 - 0.5;
        // first column at the top
        let top_down: Vec<String> = self.labels.iter().rev().cloned().collect();
        let x_fmt = |v: &f64| index_label(&self.labels, *v);
        let y_fmt = |v: &f64| index_label(&top_down, *v);

        let mut chart = ChartBuilder::on(root)
            .caption("Correlation Matrix", (FONT, 28))
            .margin(20)
            .x_label_area_size(120)
            .y_label_area_size(160)
            .build_cartesian_2d(-0.5..extent, -0.5..extent)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n + 1)
            .y_labels(n + 1)
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .draw()?;

        let cells = self.matrix.iter().enumerate().flat_map(|(i, row)| {
            row.iter().enumerate().map(move |(j, r)| (i, j, *r))
        });

        let row_pos = |i: usize| (n - 1 - i) as f64;
        chart.draw_series(cells.clone().map(|(i, j, r)| {
            let (x, y) = (j as f64, row_pos(i));
            let color = r.map(coolwarm).unwrap_or(UNDEFINED);
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
        }))?;

        let anchor = Pos::new(HPos::Center, VPos::Center);
        chart.draw_series(cells.filter_map(|(i, j, r)| {
            let r = r?;
            let ink = if r.abs() > 0.6 { WHITE } else { BLACK };
            Some(Text::new(
                format!("{:.2}", r),
                (j as f64, row_pos(i)),
                (FONT, 18).into_font().color(&ink).pos(anchor),
            ))
        }))?;
        Ok(())
    }
}
