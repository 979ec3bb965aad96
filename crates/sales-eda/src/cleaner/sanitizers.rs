//! Cell-level sanitization: whitespace trimming and duplicate removal.

use crate::error::Result;
use crate::utils::column_names;
use polars::prelude::*;
use tracing::debug;

/// Trim surrounding whitespace from every text cell.
///
/// Nulls stay null. Returns the new frame and the names of the columns in
/// which at least one cell changed.
pub(crate) fn trim_text_columns(df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
    let mut df = df;
    let mut changed_columns = Vec::new();

    for col_name in &column_names(&df) {
        let Ok(col) = df.column(col_name) else {
            continue;
        };
        let series = col.as_materialized_series();
        if series.dtype() != &DataType::String {
            continue;
        }

        let str_series = series.str()?;
        let mut changed = 0usize;
        let trimmed: Vec<Option<String>> = str_series
            .into_iter()
            .map(|opt_val| {
                opt_val.map(|val| {
                    let t = val.trim();
                    if t.len() != val.len() {
                        changed += 1;
                    }
                    t.to_string()
                })
            })
            .collect();

        if changed > 0 {
            debug!("Trimmed {} cells in '{}'", changed, col_name);
            let cleaned_series = Series::new(col_name.as_str().into(), trimmed);
            df.replace(col_name, cleaned_series)?;
            changed_columns.push(col_name.clone());
        }
    }

    Ok((df, changed_columns))
}

/// Drop exact duplicate rows, keeping the first occurrence in input order.
///
/// Returns the new frame and the number of rows removed. Nulls compare equal
/// to each other and distinct from every value.
pub(crate) fn deduplicate_rows(df: DataFrame) -> Result<(DataFrame, usize)> {
    if df.height() == 0 || df.width() == 0 {
        return Ok((df, 0));
    }

    let before = df.height();
    let unique = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    let duplicates = before - unique.height();
    if duplicates > 0 {
        debug!("Dropped {} duplicate rows", duplicates);
    }
    Ok((unique, duplicates))
}
