//! Imputation module for handling missing values.
//!
//! Columns are filled by kind: numeric first (median), then datetime
//! (median timestamp), then everything else (`"Unknown"`). NaN and infinite
//! numeric cells are treated as missing. After [`impute_all`] no cell in the
//! table is null or non-finite.

mod statistical;

pub use statistical::{StatisticalImputer, UNKNOWN};

use crate::error::Result;
use crate::types::ImputationRecord;
use crate::utils::{DtypeCategory, non_finite_count, series_dtype_category};
use polars::prelude::*;
use tracing::{debug, info};

/// Output of [`impute_all`].
#[derive(Debug, Clone)]
pub struct ImputationResult {
    pub df: DataFrame,
    pub records: Vec<ImputationRecord>,
    pub warnings: Vec<String>,
}

/// Fill every null in the table. The input is not modified.
pub fn impute_all(df: &DataFrame) -> Result<ImputationResult> {
    let mut df = df.clone();
    let mut records = Vec::new();
    let mut warnings = Vec::new();

    let mut numeric = Vec::new();
    let mut datetime = Vec::new();
    let mut other = Vec::new();
    for col in df.get_columns() {
        if col.null_count() == 0 && non_finite_count(col.as_materialized_series())? == 0 {
            continue;
        }
        let name = col.name().to_string();
        match series_dtype_category(col.as_materialized_series()) {
            DtypeCategory::Numeric => numeric.push(name),
            DtypeCategory::Datetime => datetime.push(name),
            _ => other.push(name),
        }
    }

    for name in &numeric {
        StatisticalImputer::apply_numeric_median(&mut df, name, &mut records, &mut warnings)?;
    }
    for name in &datetime {
        StatisticalImputer::apply_datetime_median(&mut df, name, &mut records, &mut warnings)?;
    }
    for name in &other {
        StatisticalImputer::apply_unknown(&mut df, name, &mut records)?;
    }

    for record in &records {
        debug!(
            "Filled {} nulls in '{}' with {}",
            record.filled, record.column, record.value
        );
    }
    info!("Imputation complete: {} columns filled", records.len());

    Ok(ImputationResult {
        df,
        records,
        warnings,
    })
}
