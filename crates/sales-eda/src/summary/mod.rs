//! Read-only summaries of the derived table.
//!
//! Produces the descriptive statistics table, the correlation matrix and the
//! top products aggregation. None of them modifies the input.

pub mod statistics;

use crate::error::Result;
use crate::features::dates::format_millis;
use crate::schema::{Capabilities, columns};
use crate::utils::{
    DtypeCategory, datetime_millis, frame_from_series, numeric_values, series_dtype_category,
};
use polars::prelude::*;
use statistics::{mean, pearson, quantile_sorted, sample_std, sorted};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Row labels of the descriptive statistics table, in order.
pub const DESCRIBE_ROWS: [&str; 11] = [
    "count", "unique", "top", "freq", "mean", "std", "min", "25%", "50%", "75%", "max",
];

/// Builds the summary tables.
#[derive(Debug, Clone, Copy)]
pub struct Summarizer {
    top_products: usize,
}

impl Default for Summarizer {
    fn default() -> Self {
        Self { top_products: 20 }
    }
}

impl Summarizer {
    pub fn new(top_products: usize) -> Self {
        Self { top_products }
    }

    /// Descriptive statistics for every column.
    ///
    /// The first column, `statistic`, holds the row labels; every other
    /// column is text so numeric and categorical summaries can share it.
    pub fn describe(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = vec![Series::new(
            "statistic".into(),
            DESCRIBE_ROWS.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        )];

        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let cells = match series_dtype_category(series) {
                DtypeCategory::Numeric => describe_numeric(series)?,
                DtypeCategory::Datetime => describe_datetime(series)?,
                _ => describe_text(series)?,
            };
            out.push(Series::new(col.name().clone(), cells));
        }

        Ok(frame_from_series(out)?)
    }

    /// Pairwise Pearson correlations between numeric columns.
    ///
    /// `None` when fewer than two numeric columns exist.
    pub fn correlation(&self, df: &DataFrame) -> Result<Option<DataFrame>> {
        let numeric = Capabilities::of(df).numeric_columns();
        if numeric.len() < 2 {
            debug!("Correlation skipped: {} numeric columns", numeric.len());
            return Ok(None);
        }

        let values: Vec<Vec<Option<f64>>> = numeric
            .iter()
            .map(|name| numeric_values(df.column(name)?.as_materialized_series()))
            .collect::<PolarsResult<_>>()?;

        let mut out = vec![Series::new("column".into(), numeric.clone())];
        for (j, name) in numeric.iter().enumerate() {
            let column: Vec<Option<f64>> = (0..numeric.len())
                .map(|i| {
                    let r = pearson(&values[i], &values[j]);
                    // exact 1 on the diagonal unless the column is constant
                    if i == j { r.map(|_| 1.0) } else { r }
                })
                .collect();
            out.push(Series::new(name.as_str().into(), column));
        }

        Ok(Some(frame_from_series(out)?))
    }

    /// Revenue per product, highest first.
    ///
    /// Columns: `product_id`, `total_revenue`, then `total_qty` and
    /// `avg_rating` when `quantity` and `rating` exist. Ties in revenue are
    /// broken by `product_id` ascending. `None` unless both `product_id` and
    /// `total_amount` exist.
    pub fn top_products(&self, df: &DataFrame) -> Result<Option<DataFrame>> {
        let caps = Capabilities::of(df);
        if !caps.has_all(&[columns::PRODUCT_ID, columns::TOTAL_AMOUNT]) {
            return Ok(None);
        }

        let ids = df
            .column(columns::PRODUCT_ID)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let revenue = numeric_values(df.column(columns::TOTAL_AMOUNT)?.as_materialized_series())?;
        let quantity = optional_numeric(df, columns::QUANTITY)?;
        let rating = optional_numeric(df, columns::RATING)?;

        let mut groups: HashMap<&str, ProductTotals> = HashMap::new();
        for (row, id) in ids.str()?.into_iter().enumerate() {
            let Some(id) = id else {
                continue;
            };
            let entry = groups.entry(id).or_default();
            if let Some(v) = revenue[row] {
                entry.revenue += v;
            }
            if let Some(v) = quantity.as_ref().and_then(|q| q[row]) {
                entry.quantity += v;
            }
            if let Some(v) = rating.as_ref().and_then(|r| r[row]) {
                entry.rating_sum += v;
                entry.rating_count += 1;
            }
        }

        let mut ranked: Vec<(&str, ProductTotals)> = groups.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.revenue
                .partial_cmp(&a.1.revenue)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.truncate(self.top_products);

        let mut out = vec![
            Series::new(
                columns::PRODUCT_ID.into(),
                ranked.iter().map(|(id, _)| id.to_string()).collect::<Vec<_>>(),
            ),
            Series::new(
                "total_revenue".into(),
                ranked.iter().map(|(_, t)| t.revenue).collect::<Vec<_>>(),
            ),
        ];
        if quantity.is_some() {
            out.push(Series::new(
                "total_qty".into(),
                ranked.iter().map(|(_, t)| t.quantity).collect::<Vec<_>>(),
            ));
        }
        if rating.is_some() {
            out.push(Series::new(
                "avg_rating".into(),
                ranked.iter().map(|(_, t)| t.avg_rating()).collect::<Vec<_>>(),
            ));
        }

        Ok(Some(frame_from_series(out)?))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ProductTotals {
    revenue: f64,
    quantity: f64,
    rating_sum: f64,
    rating_count: usize,
}

impl ProductTotals {
    fn avg_rating(&self) -> Option<f64> {
        if self.rating_count == 0 {
            None
        } else {
            Some(self.rating_sum / self.rating_count as f64)
        }
    }
}

fn optional_numeric(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    match df.column(name) {
        Ok(col) => Ok(Some(numeric_values(col.as_materialized_series())?)),
        Err(_) => Ok(None),
    }
}

fn fmt_num(v: f64) -> String {
    format!("{}", v)
}

fn describe_numeric(series: &Series) -> Result<Vec<Option<String>>> {
    let present: Vec<f64> = numeric_values(series)?.into_iter().flatten().collect();
    let s = sorted(&present);
    let q = |p: f64| quantile_sorted(&s, p).map(fmt_num);

    Ok(vec![
        Some(present.len().to_string()),
        None,
        None,
        None,
        mean(&present).map(fmt_num),
        sample_std(&present).map(fmt_num),
        s.first().copied().map(fmt_num),
        q(0.25),
        q(0.5),
        q(0.75),
        s.last().copied().map(fmt_num),
    ])
}

fn describe_datetime(series: &Series) -> Result<Vec<Option<String>>> {
    let present: Vec<i64> = datetime_millis(series)?.into_iter().flatten().collect();
    let as_f64: Vec<f64> = present.iter().map(|v| *v as f64).collect();
    let s = sorted(&as_f64);
    let ts = |v: f64| format_millis(v.round() as i64);
    let q = |p: f64| quantile_sorted(&s, p).map(ts);

    Ok(vec![
        Some(present.len().to_string()),
        None,
        None,
        None,
        mean(&as_f64).map(ts),
        None,
        s.first().copied().map(ts),
        q(0.25),
        q(0.5),
        q(0.75),
        s.last().copied().map(ts),
    ])
}

fn describe_text(series: &Series) -> Result<Vec<Option<String>>> {
    let text = series.cast(&DataType::String)?;
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut count = 0usize;
    for (row, value) in text.str()?.into_iter().enumerate() {
        let Some(value) = value else {
            continue;
        };
        count += 1;
        counts.entry(value).or_insert((0, row)).0 += 1;
    }

    // most frequent, earliest first occurrence on ties
    let top = counts
        .iter()
        .max_by(|a, b| a.1.0.cmp(&b.1.0).then_with(|| b.1.1.cmp(&a.1.1)))
        .map(|(value, (freq, _))| (value.to_string(), *freq));

    Ok(vec![
        Some(count.to_string()),
        Some(counts.len().to_string()),
        top.as_ref().map(|(v, _)| v.clone()),
        top.as_ref().map(|(_, f)| f.to_string()),
        None,
        None,
        None,
        None,
        None,
        None,
        None,
    ])
}
