//! Feature derivation.
//!
//! Runs in a fixed order: parse dates, coerce numerics, derive columns,
//! null out non-finite numbers, impute every remaining null. Each derived column is gated on its source
//! columns and reported as a [`StepOutcome`].

pub mod dates;

use crate::error::Result;
use crate::imputers::impute_all;
use crate::loader::missing_values;
use crate::schema::{Capabilities, StepOutcome, columns};
use crate::types::{ActionType, EdaAction, ImputationRecord, MissingCount};
use crate::utils::{
    column_names, datetime_millis, datetime_series, finite_series, is_datetime_dtype,
    non_finite_count, numeric_values, parse_numeric_string,
};
use dates::{days_between, parse_date_millis};
use polars::prelude::*;
use tracing::{debug, info};

/// Text used for a missing review when measuring its length.
const MISSING_REVIEW: &str = "None";

/// Output of [`FeatureDeriver::derive`].
#[derive(Debug, Clone)]
pub struct FeatureResult {
    /// Derived and fully imputed table.
    pub df: DataFrame,
    pub steps: Vec<StepOutcome>,
    pub actions: Vec<EdaAction>,
    /// Null counts after derivation, before imputation.
    pub missing_before_imputation: Vec<MissingCount>,
    pub imputations: Vec<ImputationRecord>,
    pub warnings: Vec<String>,
}

/// Parses, coerces, derives and imputes.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureDeriver;

impl FeatureDeriver {
    pub fn new() -> Self {
        Self
    }

    /// Run the whole stage on a copy of the table.
    pub fn derive(&self, df: &DataFrame) -> Result<FeatureResult> {
        let mut df = df.clone();
        let mut actions = Vec::new();

        self.parse_dates(&mut df, &mut actions)?;
        self.coerce_numerics(&mut df, &mut actions)?;
        let steps = self.derive_columns(&mut df, &mut actions)?;
        self.null_non_finite(&mut df, &mut actions)?;

        let missing_before_imputation = missing_values(&df);
        for entry in missing_before_imputation.iter().filter(|m| m.nulls > 0) {
            info!("Missing values in '{}': {}", entry.column, entry.nulls);
        }

        let imputed = impute_all(&df)?;
        for record in &imputed.records {
            actions.push(EdaAction::new(
                ActionType::ValueImputed,
                &record.column,
                format!("Filled {} nulls with {}", record.filled, record.value),
            ));
        }

        Ok(FeatureResult {
            df: imputed.df,
            steps,
            actions,
            missing_before_imputation,
            imputations: imputed.records,
            warnings: imputed.warnings,
        })
    }

    /// Parse the recognized date columns into millisecond datetimes.
    ///
    /// Unparseable cells become null.
    pub fn parse_dates(&self, df: &mut DataFrame, actions: &mut Vec<EdaAction>) -> Result<()> {
        for name in columns::DATE_COLUMNS {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let series = column.as_materialized_series();

            let millis: Vec<Option<i64>> = if is_datetime_dtype(series.dtype()) {
                datetime_millis(series)?
            } else {
                let text = series.cast(&DataType::String)?;
                text.str()?
                    .into_iter()
                    .map(|v| v.and_then(parse_date_millis))
                    .collect()
            };

            let before = series.len() - series.null_count();
            let parsed = millis.iter().filter(|v| v.is_some()).count();
            df.replace(name, datetime_series(name, millis)?)?;

            debug!("Parsed '{}': {} of {} values", name, parsed, before);
            actions.push(EdaAction::new(
                ActionType::DateParsed,
                name,
                format!("Parsed {} dates, {} unparseable", parsed, before - parsed),
            ));
        }
        Ok(())
    }

    /// Coerce the recognized numeric columns to `Float64`.
    ///
    /// Non-numeric text becomes null, and so do `NaN` and infinite values,
    /// whether they arrive as text or were already read as floats.
    pub fn coerce_numerics(&self, df: &mut DataFrame, actions: &mut Vec<EdaAction>) -> Result<()> {
        for name in columns::NUMERIC_COLUMNS {
            let Ok(column) = df.column(name) else {
                continue;
            };
            let series = column.as_materialized_series();
            if series.dtype() == &DataType::Float64 && non_finite_count(series)? == 0 {
                continue;
            }

            let values: Vec<Option<f64>> = if series.dtype() == &DataType::String {
                series
                    .str()?
                    .into_iter()
                    .map(|v| v.and_then(parse_numeric_string))
                    .collect()
            } else {
                numeric_values(series)?
            };

            let invalid = values.iter().filter(|v| v.is_none()).count() - series.null_count();
            df.replace(name, Series::new(name.into(), values))?;

            actions.push(EdaAction::new(
                ActionType::NumericCoerced,
                name,
                format!("Coerced to numbers, {} non-numeric values set to null", invalid),
            ));
        }
        Ok(())
    }

    /// Append every derived column whose sources exist.
    pub fn derive_columns(
        &self,
        df: &mut DataFrame,
        actions: &mut Vec<EdaAction>,
    ) -> Result<Vec<StepOutcome>> {
        let steps = vec![
            self.day_difference(
                df,
                columns::DELIVERY_DAYS,
                columns::ORDER_DATE,
                columns::SHIP_DATE,
            )?,
            self.day_difference(
                df,
                columns::REVIEW_DELAY_DAYS,
                columns::ORDER_DATE,
                columns::REVIEW_DATE,
            )?,
            self.review_length(df)?,
            self.price_per_item(df)?,
        ];

        for step in &steps {
            match step {
                StepOutcome::Applied { step, detail } => {
                    info!("Derived '{}': {}", step, detail);
                    actions.push(EdaAction::new(ActionType::FeatureDerived, step, detail));
                }
                StepOutcome::Skipped {
                    step,
                    missing_columns,
                } => {
                    info!("Skipped '{}': missing {}", step, missing_columns.join(", "));
                }
            }
        }
        Ok(steps)
    }

    /// Null every NaN or infinite cell left in any float column.
    ///
    /// Covers derived columns and numeric columns outside the recognized set.
    pub fn null_non_finite(&self, df: &mut DataFrame, actions: &mut Vec<EdaAction>) -> Result<()> {
        for name in column_names(df) {
            let series = df.column(&name)?.as_materialized_series();
            let bad = non_finite_count(series)?;
            if bad == 0 {
                continue;
            }

            let finite = finite_series(series)?;
            df.replace(&name, finite)?;
            debug!("Nulled {} non-finite values in '{}'", bad, name);
            actions.push(EdaAction::new(
                ActionType::NumericCoerced,
                &name,
                format!("{} NaN or infinite values set to null", bad),
            ));
        }
        Ok(())
    }

    /// `later - earlier` in whole days, sign kept.
    fn day_difference(
        &self,
        df: &mut DataFrame,
        target: &str,
        earlier: &str,
        later: &str,
    ) -> Result<StepOutcome> {
        if let Err(skipped) = Capabilities::of(df).require(target, &[earlier, later]) {
            return Ok(skipped);
        }

        let start = datetime_millis(df.column(earlier)?.as_materialized_series())?;
        let end = datetime_millis(df.column(later)?.as_materialized_series())?;
        let days: Vec<Option<i64>> = start
            .iter()
            .zip(end.iter())
            .map(|(s, e)| match (s, e) {
                (Some(s), Some(e)) => Some(days_between(*s, *e)),
                _ => None,
            })
            .collect();

        let negative = days.iter().flatten().filter(|d| **d < 0).count();
        df.with_column(Series::new(target.into(), days))?;

        Ok(StepOutcome::applied(
            target,
            format!("{} - {} in days ({} negative)", later, earlier, negative),
        ))
    }

    /// Character count of each review; a missing review counts as "None".
    fn review_length(&self, df: &mut DataFrame) -> Result<StepOutcome> {
        let target = columns::REVIEW_LENGTH;
        if let Err(skipped) = Capabilities::of(df).require(target, &[columns::REVIEW_TEXT]) {
            return Ok(skipped);
        }

        let text = df
            .column(columns::REVIEW_TEXT)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let lengths: Vec<i64> = text
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or(MISSING_REVIEW).chars().count() as i64)
            .collect();

        df.with_column(Series::new(target.into(), lengths))?;
        Ok(StepOutcome::applied(target, "character count of review_text"))
    }

    /// `total_amount / quantity`, with a quantity of 0 treated as 1.
    fn price_per_item(&self, df: &mut DataFrame) -> Result<StepOutcome> {
        let target = columns::PRICE_PER_ITEM;
        if let Err(skipped) = Capabilities::of(df)
            .require(target, &[columns::TOTAL_AMOUNT, columns::QUANTITY])
        {
            return Ok(skipped);
        }

        let totals = numeric_values(df.column(columns::TOTAL_AMOUNT)?.as_materialized_series())?;
        let quantities = numeric_values(df.column(columns::QUANTITY)?.as_materialized_series())?;

        let mut guarded = 0usize;
        let per_item: Vec<Option<f64>> = totals
            .iter()
            .zip(quantities.iter())
            .map(|(total, qty)| match (total, qty) {
                (Some(total), Some(qty)) => {
                    let divisor = if *qty == 0.0 {
                        guarded += 1;
                        1.0
                    } else {
                        *qty
                    };
                    Some(total / divisor).filter(|v| v.is_finite())
                }
                _ => None,
            })
            .collect();

        df.with_column(Series::new(target.into(), per_item))?;
        Ok(StepOutcome::applied(
            target,
            format!("total_amount / quantity ({} zero quantities treated as 1)", guarded),
        ))
    }
}
