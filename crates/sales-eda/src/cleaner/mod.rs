//! Table cleaning.
//!
//! This module provides:
//! - Trimming surrounding whitespace from text cells
//! - Removing exact duplicate rows (first occurrence wins)
//!
//! Trimming runs first so that rows differing only in padding collapse
//! together, and a second pass over the output changes nothing.

mod sanitizers;

use crate::error::Result;
use crate::types::{ActionType, EdaAction};
use polars::prelude::*;
use tracing::{debug, info};

/// Output of [`DataCleaner::clean`].
#[derive(Debug, Clone)]
pub struct CleaningResult {
    pub df: DataFrame,
    pub duplicates_removed: usize,
    pub trimmed_columns: Vec<String>,
    pub actions: Vec<EdaAction>,
}

/// Data cleaner for whitespace and duplicate rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataCleaner;

impl DataCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Clean a table, returning a new one. The input is not modified.
    pub fn clean(&self, df: &DataFrame) -> Result<CleaningResult> {
        let mut actions = Vec::new();
        let before = df.height();

        let (df, trimmed_columns) = sanitizers::trim_text_columns(df.clone())?;
        for column in &trimmed_columns {
            actions.push(EdaAction::new(
                ActionType::TextTrimmed,
                column,
                "Trimmed surrounding whitespace",
            ));
        }

        let (df, duplicates_removed) = sanitizers::deduplicate_rows(df)?;
        if duplicates_removed > 0 {
            let pct = (duplicates_removed as f64 / before as f64) * 100.0;
            actions.push(EdaAction::new(
                ActionType::DuplicatesRemoved,
                "dataset",
                format!("Removed {} duplicate rows ({:.1}%)", duplicates_removed, pct),
            ));
        } else {
            debug!("No duplicate rows found");
        }

        info!(
            "Cleaning complete: {} -> {} rows ({} duplicates removed)",
            before,
            df.height(),
            duplicates_removed
        );

        Ok(CleaningResult {
            df,
            duplicates_removed,
            trimmed_columns,
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messy() -> DataFrame {
        df![
            "product_id" => ["P1", "P1 ", "P2", "P1", "P3"],
            "category" => [Some("Books"), Some("Books"), None, Some(" Books"), Some("Toys")],
            "price" => [10.0, 10.0, 5.0, 10.0, 7.5],
        ]
        .unwrap()
    }

    #[test]
    fn test_clean_trims_then_dedupes() {
        let result = DataCleaner::new().clean(&messy()).unwrap();

        assert_eq!(result.duplicates_removed, 2);
        assert_eq!(result.df.height(), 3);
        assert_eq!(result.trimmed_columns, vec!["product_id", "category"]);
        assert!(
            result
                .actions
                .iter()
                .any(|a| a.action_type == ActionType::DuplicatesRemoved)
        );
    }

    #[test]
    fn test_clean_leaves_input_untouched() {
        let input = messy();
        let _ = DataCleaner::new().clean(&input).unwrap();
        assert_eq!(input.height(), 5);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let cleaner = DataCleaner::new();
        let once = cleaner.clean(&messy()).unwrap();
        let twice = cleaner.clean(&once.df).unwrap();

        assert_eq!(twice.duplicates_removed, 0);
        assert!(twice.trimmed_columns.is_empty());
        assert!(once.df.equals_missing(&twice.df));
    }

    #[test]
    fn test_no_duplicates_remain() {
        let result = DataCleaner::new().clean(&messy()).unwrap();
        let duplicated = result.df.is_duplicated().unwrap();
        assert!(!duplicated.any());
    }

    #[test]
    fn test_empty_table() {
        let df = DataFrame::empty();
        let result = DataCleaner::new().clean(&df).unwrap();
        assert_eq!(result.df.height(), 0);
        assert_eq!(result.duplicates_removed, 0);
    }
}
