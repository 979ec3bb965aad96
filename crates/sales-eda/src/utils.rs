//! Shared utilities for the EDA pipeline.
//!
//! This module contains common helper functions used across multiple stages
//! to reduce code duplication and ensure consistency.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Category of a data type for analysis purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Date or datetime types
    Datetime,
    /// Boolean type
    Boolean,
    /// String/text type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if is_datetime_dtype(dtype) {
        DtypeCategory::Datetime
    } else if matches!(dtype, DataType::Boolean) {
        DtypeCategory::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

/// Get the dtype category of a Series.
pub fn series_dtype_category(series: &Series) -> DtypeCategory {
    get_dtype_category(series.dtype())
}

/// Build a frame from equally long series.
pub fn frame_from_series(columns: Vec<Series>) -> PolarsResult<DataFrame> {
    let mut df = DataFrame::empty();
    for series in columns {
        df.with_column(series)?;
    }
    Ok(df)
}

/// Column names of a frame, in table order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Parse a text cell as a finite number.
///
/// Surrounding whitespace is ignored. `NaN` and infinities are rejected so
/// that they end up as nulls like any other non-numeric text.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Replace every character that is unsafe in a file name with `_`.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "column".to_string()
    } else {
        cleaned
    }
}

// =============================================================================
// Series Extraction Utilities
// =============================================================================

/// Read a numeric (or numeric-castable) Series as `f64` options.
///
/// NaN and infinite cells are reported as missing.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let floats = series.cast(&DataType::Float64)?;
    Ok(floats
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

/// `Float64` copy of a numeric Series with every non-finite cell nulled.
pub fn finite_series(series: &Series) -> PolarsResult<Series> {
    Ok(Series::new(series.name().clone(), numeric_values(series)?))
}

/// Number of NaN or infinite cells in a float Series.
pub fn non_finite_count(series: &Series) -> PolarsResult<usize> {
    let count = match series.dtype() {
        DataType::Float32 | DataType::Float64 => series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .flatten()
            .filter(|x| !x.is_finite())
            .count(),
        _ => 0,
    };
    Ok(count)
}

/// Read only the present values of a numeric Series.
pub fn present_values(series: &Series) -> PolarsResult<Vec<f64>> {
    Ok(numeric_values(series)?.into_iter().flatten().collect())
}

/// Read a datetime Series as epoch milliseconds.
pub fn datetime_millis(series: &Series) -> PolarsResult<Vec<Option<i64>>> {
    let millis: Vec<Option<i64>> = match series.dtype() {
        DataType::Date => {
            // days since epoch
            let days = series.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .map(|d| d.map(|d| i64::from(d) * 86_400_000))
                .collect()
        }
        DataType::Datetime(unit, _) => {
            let factor_num: i64 = match unit {
                TimeUnit::Milliseconds => 1,
                TimeUnit::Microseconds => 1_000,
                TimeUnit::Nanoseconds => 1_000_000,
            };
            let raw = series.cast(&DataType::Int64)?;
            raw.i64()?
                .into_iter()
                .map(|v| v.map(|v| v.div_euclid(factor_num)))
                .collect()
        }
        _ => {
            let raw = series.cast(&DataType::Int64)?;
            raw.i64()?.into_iter().collect()
        }
    };
    Ok(millis)
}

/// Build a millisecond datetime Series from epoch milliseconds.
pub fn datetime_series(name: &str, millis: Vec<Option<i64>>) -> PolarsResult<Series> {
    Series::new(name.into(), millis).cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
}

// =============================================================================
// Statistics Utilities
// =============================================================================

/// Median of integer timestamps; the even-length midpoint rounds down.
pub fn median_i64(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let (a, b) = (sorted[mid - 1], sorted[mid]);
        Some(a + (b - a).div_euclid(2))
    } else {
        Some(sorted[mid])
    }
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// The result is always `Float64`.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let filled: Vec<f64> = numeric_values(series)?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
///
/// Non-string series are rendered to text first.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let text = series.cast(&DataType::String)?;
    let filled: Vec<String> = text
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value).to_string())
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_dtype_category() {
        assert_eq!(get_dtype_category(&DataType::Int64), DtypeCategory::Numeric);
        assert_eq!(get_dtype_category(&DataType::Date), DtypeCategory::Datetime);
        assert_eq!(
            get_dtype_category(&DataType::Datetime(TimeUnit::Milliseconds, None)),
            DtypeCategory::Datetime
        );
        assert_eq!(get_dtype_category(&DataType::Boolean), DtypeCategory::Boolean);
        assert_eq!(get_dtype_category(&DataType::String), DtypeCategory::String);
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("  -3.5 "), Some(-3.5));
        assert_eq!(parse_numeric_string("1e3"), Some(1000.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("abc"), None);
        assert_eq!(parse_numeric_string("NaN"), None);
        assert_eq!(parse_numeric_string("inf"), None);
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("total_amount"), "total_amount");
        assert_eq!(sanitize_file_stem("unit price ($)"), "unit_price____");
        assert_eq!(sanitize_file_stem("   "), "column");
    }

    #[test]
    fn test_numeric_values_drops_non_finite() {
        let series = Series::new(
            "x".into(),
            &[Some(1.0), Some(f64::NAN), None, Some(f64::INFINITY), Some(f64::NEG_INFINITY)],
        );
        assert_eq!(
            numeric_values(&series).unwrap(),
            vec![Some(1.0), None, None, None, None]
        );
        assert_eq!(non_finite_count(&series).unwrap(), 3);
    }

    #[test]
    fn test_finite_series_nulls_nan_and_inf() {
        let series = Series::new("price".into(), &[f64::NAN, 2.5, f64::INFINITY]);
        let finite = finite_series(&series).unwrap();
        assert_eq!(finite.name().as_str(), "price");
        assert_eq!(finite.null_count(), 2);
        assert_eq!(non_finite_count(&finite).unwrap(), 0);
    }

    #[test]
    fn test_datetime_round_trip_millis() {
        let millis = vec![Some(86_400_000i64), None];
        let series = datetime_series("d", millis.clone()).unwrap();
        assert!(is_datetime_dtype(series.dtype()));
        assert_eq!(datetime_millis(&series).unwrap(), millis);
    }

    #[test]
    fn test_median_i64() {
        assert_eq!(median_i64(&[]), None);
        assert_eq!(median_i64(&[10, 0]), Some(5));
        assert_eq!(median_i64(&[7, 1, 4]), Some(4));
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1i64), None, Some(3)]);
        let filled = fill_numeric_nulls(&series, 2.0).unwrap();

        assert_eq!(filled.dtype(), &DataType::Float64);
        let values: Vec<f64> = filled.f64().unwrap().into_iter().flatten().collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("test".into(), &[Some("a"), None]);
        let filled = fill_string_nulls(&series, "Unknown").unwrap();
        let values: Vec<&str> = filled.str().unwrap().into_iter().flatten().collect();
        assert_eq!(values, vec!["a", "Unknown"]);
    }
}
