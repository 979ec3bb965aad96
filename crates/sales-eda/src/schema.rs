//! Recognized columns and schema-capability queries.
//!
//! Every recognized column is optional. Stages ask [`Capabilities`] whether
//! the columns they need exist and report a [`StepOutcome`] either way, so an
//! absent column shows up as an explicit skip instead of silence.

use crate::utils::{DtypeCategory, series_dtype_category};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column names the pipeline knows about.
pub mod columns {
    pub const PRODUCT_ID: &str = "product_id";
    pub const CATEGORY: &str = "category";
    pub const PRICE: &str = "price";
    pub const QUANTITY: &str = "quantity";
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const SHIPPING_COST: &str = "shipping_cost";
    pub const RATING: &str = "rating";
    pub const ORDER_DATE: &str = "order_date";
    pub const SHIP_DATE: &str = "ship_date";
    pub const REVIEW_DATE: &str = "review_date";
    pub const REVIEW_TEXT: &str = "review_text";

    pub const DELIVERY_DAYS: &str = "delivery_days";
    pub const REVIEW_DELAY_DAYS: &str = "review_delay_days";
    pub const REVIEW_LENGTH: &str = "review_length";
    pub const PRICE_PER_ITEM: &str = "price_per_item";

    /// Text columns parsed into datetimes.
    pub const DATE_COLUMNS: [&str; 3] = [ORDER_DATE, SHIP_DATE, REVIEW_DATE];

    /// Columns coerced to numbers.
    pub const NUMERIC_COLUMNS: [&str; 5] = [PRICE, TOTAL_AMOUNT, QUANTITY, SHIPPING_COST, RATING];

    /// Columns always held as text, whatever their content looks like.
    pub const TEXT_COLUMNS: [&str; 3] = [PRODUCT_ID, CATEGORY, REVIEW_TEXT];
}

/// Read-only view answering "does this table have columns X, Y?".
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    df: &'a DataFrame,
}

impl<'a> Capabilities<'a> {
    pub fn of(df: &'a DataFrame) -> Self {
        Self { df }
    }

    /// Whether a column with this name exists.
    pub fn has(&self, column: &str) -> bool {
        self.df.column(column).is_ok()
    }

    /// Whether every listed column exists.
    pub fn has_all(&self, required: &[&str]) -> bool {
        required.iter().all(|c| self.has(c))
    }

    /// The listed columns that are absent, in the order given.
    pub fn missing(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.has(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Numeric columns in table order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns_of(DtypeCategory::Numeric)
    }

    /// Text columns in table order.
    pub fn text_columns(&self) -> Vec<String> {
        self.columns_of(DtypeCategory::String)
    }

    /// Date/datetime columns in table order.
    pub fn datetime_columns(&self) -> Vec<String> {
        self.columns_of(DtypeCategory::Datetime)
    }

    fn columns_of(&self, category: DtypeCategory) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|c| series_dtype_category(c.as_materialized_series()) == category)
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Gate an optional step: `Ok(())` when every column exists, otherwise
    /// the `Skipped` outcome to report.
    pub fn require(&self, step: &str, required: &[&str]) -> Result<(), StepOutcome> {
        let missing = self.missing(required);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StepOutcome::skipped(step, missing))
        }
    }
}

/// What happened to one optional derivation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied { step: String, detail: String },
    Skipped { step: String, missing_columns: Vec<String> },
}

impl StepOutcome {
    pub fn applied(step: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Applied {
            step: step.into(),
            detail: detail.into(),
        }
    }

    pub fn skipped(step: impl Into<String>, missing_columns: Vec<String>) -> Self {
        Self::Skipped {
            step: step.into(),
            missing_columns,
        }
    }

    pub fn step(&self) -> &str {
        match self {
            Self::Applied { step, .. } | Self::Skipped { step, .. } => step,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
