//! Statistical imputation methods.
//!
//! Each column's fill value is computed from that column's own non-null
//! values, so the order in which columns are filled does not change the result.

use crate::error::Result;
use crate::features::dates::format_millis;
use crate::types::{ImputationMethod, ImputationRecord};
use crate::utils::{
    datetime_millis, datetime_series, fill_numeric_nulls, fill_string_nulls, finite_series,
    median_i64,
};
use polars::prelude::*;
use tracing::warn;

/// Placeholder written into text cells that were missing.
pub const UNKNOWN: &str = "Unknown";

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill a numeric column's nulls with the median of its finite values.
    ///
    /// NaN and infinite cells count as missing. A column with no finite
    /// value at all is filled with `0.0` and a warning.
    pub fn apply_numeric_median(
        df: &mut DataFrame,
        col_name: &str,
        records: &mut Vec<ImputationRecord>,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let Ok(column) = df.column(col_name) else {
            return Ok(());
        };
        let series = finite_series(column.as_materialized_series())?;
        let filled_count = series.null_count();
        if filled_count == 0 {
            return Ok(());
        }

        let (value, method) = match series.median() {
            Some(m) => (m, ImputationMethod::Median),
            None => {
                let message = format!("Column '{}' has no numeric values; filled with 0", col_name);
                warn!("{}", message);
                warnings.push(message);
                (0.0, ImputationMethod::Zero)
            }
        };

        let filled = fill_numeric_nulls(&series, value)?;
        df.replace(col_name, filled)?;

        records.push(ImputationRecord {
            column: col_name.to_string(),
            method,
            filled: filled_count,
            value: format!("{}", value),
        });
        Ok(())
    }

    /// Fill a datetime column's nulls with its median timestamp.
    ///
    /// A column with no timestamps at all falls back to text and `"Unknown"`.
    pub fn apply_datetime_median(
        df: &mut DataFrame,
        col_name: &str,
        records: &mut Vec<ImputationRecord>,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        let Some(series) = Self::series_with_nulls(df, col_name) else {
            return Ok(());
        };

        let millis = datetime_millis(&series)?;
        let present: Vec<i64> = millis.iter().flatten().copied().collect();
        let Some(fill) = median_i64(&present) else {
            let message = format!("Column '{}' has no valid dates; filled with '{}'", col_name, UNKNOWN);
            warn!("{}", message);
            warnings.push(message);
            return Self::apply_unknown(df, col_name, records);
        };

        let filled_count = millis.len() - present.len();
        let filled: Vec<Option<i64>> = millis.into_iter().map(|v| Some(v.unwrap_or(fill))).collect();
        df.replace(col_name, datetime_series(col_name, filled)?)?;

        records.push(ImputationRecord {
            column: col_name.to_string(),
            method: ImputationMethod::MedianTimestamp,
            filled: filled_count,
            value: format_millis(fill),
        });
        Ok(())
    }

    /// Fill nulls with `"Unknown"`, rendering non-text columns to text first.
    pub fn apply_unknown(
        df: &mut DataFrame,
        col_name: &str,
        records: &mut Vec<ImputationRecord>,
    ) -> Result<()> {
        let Some(series) = Self::series_with_nulls(df, col_name) else {
            return Ok(());
        };

        let filled_count = series.null_count();
        let filled = fill_string_nulls(&series, UNKNOWN)?;
        df.replace(col_name, filled)?;

        records.push(ImputationRecord {
            column: col_name.to_string(),
            method: ImputationMethod::Unknown,
            filled: filled_count,
            value: UNKNOWN.to_string(),
        });
        Ok(())
    }

    /// Owned copy of a column, only if it exists and has nulls.
    fn series_with_nulls(df: &DataFrame, col_name: &str) -> Option<Series> {
        let col = df.column(col_name).ok()?;
        if col.null_count() == 0 {
            return None;
        }
        Some(col.as_materialized_series().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::frame_from_series;

    // ========================================================================
    // apply_numeric_median() tests
    // ========================================================================

    #[test]
    fn test_apply_numeric_median_basic() {
        let mut df = df![
            "values" => [Some(1.0), None, Some(3.0), None, Some(5.0)],
        ]
        .unwrap();
        let (mut records, mut warnings) = (Vec::new(), Vec::new());

        StatisticalImputer::apply_numeric_median(&mut df, "values", &mut records, &mut warnings)
            .unwrap();

        let values = df.column("values").unwrap();
        assert_eq!(values.null_count(), 0);

        // Median of [1, 3, 5] = 3
        assert_eq!(values.get(1).unwrap().try_extract::<f64>().unwrap(), 3.0);
        assert_eq!(values.get(3).unwrap().try_extract::<f64>().unwrap(), 3.0);
        assert_eq!(values.get(4).unwrap().try_extract::<f64>().unwrap(), 5.0);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, ImputationMethod::Median);
        assert_eq!(records[0].filled, 2);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_apply_numeric_median_fills_nan_and_inf() {
        let mut df = df![
            "price" => [9.5, f64::NAN, 3.0, f64::INFINITY, 4.0],
        ]
        .unwrap();
        let (mut records, mut warnings) = (Vec::new(), Vec::new());

        StatisticalImputer::apply_numeric_median(&mut df, "price", &mut records, &mut warnings)
            .unwrap();

        let values: Vec<f64> = df
            .column("price")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        // median of 9.5, 3, 4
        assert_eq!(values, vec![9.5, 4.0, 3.0, 4.0, 4.0]);
        assert_eq!(records[0].filled, 2);
    }

    #[test]
    fn test_apply_numeric_median_integer_column_becomes_float() {
        let mut df = df![
            "quantity" => [Some(1i64), Some(2), None, Some(4)],
        ]
        .unwrap();
        let (mut records, mut warnings) = (Vec::new(), Vec::new());

        StatisticalImputer::apply_numeric_median(&mut df, "quantity", &mut records, &mut warnings)
            .unwrap();

        let values = df.column("quantity").unwrap();
        assert_eq!(values.dtype(), &DataType::Float64);
        assert_eq!(values.get(2).unwrap().try_extract::<f64>().unwrap(), 2.0);
    }

    #[test]
    fn test_apply_numeric_median_no_nulls_is_untouched() {
        let mut df = df![
            "values" => [1i64, 2, 3],
        ]
        .unwrap();
        let (mut records, mut warnings) = (Vec::new(), Vec::new());

        StatisticalImputer::apply_numeric_median(&mut df, "values", &mut records, &mut warnings)
            .unwrap();

        assert_eq!(df.column("values").unwrap().dtype(), &DataType::Int64);
        assert!(records.is_empty());
    }

    #[test]
    fn test_apply_numeric_median_all_null_uses_zero() {
        let mut df = df![
            "values" => [None::<f64>, None],
        ]
        .unwrap();
        let (mut records, mut warnings) = (Vec::new(), Vec::new());

        StatisticalImputer::apply_numeric_median(&mut df, "values", &mut records, &mut warnings)
            .unwrap();

        let values = df.column("values").unwrap();
        assert_eq!(values.null_count(), 0);
        assert_eq!(values.get(0).unwrap().try_extract::<f64>().unwrap(), 0.0);
        assert_eq!(records[0].method, ImputationMethod::Zero);
        assert_eq!(warnings.len(), 1);
    }

    // ========================================================================
    // apply_datetime_median() tests
    // ========================================================================

    #[test]
    fn test_apply_datetime_median() {
        let day = 86_400_000i64;
        let series = datetime_series("order_date", vec![Some(0), None, Some(2 * day), Some(4 * day)])
            .unwrap();
        let mut df = frame_from_series(vec![series]).unwrap();
        let (mut records, mut warnings) = (Vec::new(), Vec::new());

        StatisticalImputer::apply_datetime_median(&mut df, "order_date", &mut records, &mut warnings)
            .unwrap();

        let series = df.column("order_date").unwrap().as_materialized_series().clone();
        assert_eq!(
            datetime_millis(&series).unwrap(),
            vec![Some(0), Some(2 * day), Some(2 * day), Some(4 * day)]
        );
        assert_eq!(records[0].method, ImputationMethod::MedianTimestamp);
        assert_eq!(records[0].value, "1970-01-03 00:00:00");
    }

    #[test]
    fn test_apply_datetime_median_without_dates_falls_back_to_unknown() {
        let series = datetime_series("ship_date", vec![None, None]).unwrap();
        let mut df = frame_from_series(vec![series]).unwrap();
        let (mut records, mut warnings) = (Vec::new(), Vec::new());

        StatisticalImputer::apply_datetime_median(&mut df, "ship_date", &mut records, &mut warnings)
            .unwrap();

        let column = df.column("ship_date").unwrap();
        assert_eq!(column.dtype(), &DataType::String);
        assert_eq!(column.null_count(), 0);
        assert_eq!(records[0].method, ImputationMethod::Unknown);
        assert_eq!(warnings.len(), 1);
    }

    // ========================================================================
    // apply_unknown() tests
    // ========================================================================

    #[test]
    fn test_apply_unknown() {
        let mut df = df![
            "category" => [Some("Books"), None, Some("Toys")],
        ]
        .unwrap();
        let mut records = Vec::new();

        StatisticalImputer::apply_unknown(&mut df, "category", &mut records).unwrap();

        let values: Vec<&str> = df
            .column("category")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(values, vec!["Books", "Unknown", "Toys"]);
        assert_eq!(records[0].filled, 1);
    }

    #[test]
    fn test_missing_column_is_noop() {
        let mut df = df!["a" => [1.0]].unwrap();
        let mut records = Vec::new();
        StatisticalImputer::apply_unknown(&mut df, "nope", &mut records).unwrap();
        assert!(records.is_empty());
    }
}
