//! Integration tests for the EDA pipeline.
//!
//! These tests run the whole pipeline against small CSV fixtures and check
//! what lands on disk.

use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use sales_eda::charts::sample_indices;
use sales_eda::{
    ChartOutcome, DataCleaner, EdaConfig, EdaReport, EdaStage, ImageFormat, Pipeline,
    StepOutcome, load_dataset,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn read_csv(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn config_for(fixture: &str, output: &Path) -> EdaConfig {
    EdaConfig::builder()
        .input_path(fixtures_path().join(fixture))
        .output_dir(output)
        .image_format(ImageFormat::Svg)
        .sample_seed(7)
        .build()
        .unwrap()
}

fn run(fixture: &str, output: &Path) -> EdaReport {
    Pipeline::builder()
        .config(config_for(fixture, output))
        .build()
        .unwrap()
        .run()
        .expect("Pipeline should complete")
}

fn text_cell(df: &DataFrame, column: &str, row: usize) -> String {
    df.column(column)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::String)
        .unwrap()
        .str()
        .unwrap()
        .get(row)
        .unwrap()
        .to_string()
}

fn number_cell(df: &DataFrame, column: &str, row: usize) -> f64 {
    df.column(column)
        .unwrap()
        .get(row)
        .unwrap()
        .try_extract::<f64>()
        .unwrap()
}

// ============================================================================
// Missing input
// ============================================================================

#[test]
fn test_missing_dataset_produces_no_outputs() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("outputs");
    let config = EdaConfig::builder()
        .input_path(dir.path().join("does_not_exist.csv"))
        .output_dir(&output)
        .emit_report(true)
        .build()
        .unwrap();

    let err = Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .run()
        .unwrap_err();

    assert!(err.is_dataset_not_found());
    assert_eq!(err.error_code(), "DATASET_NOT_FOUND");
    assert!(!output.exists(), "no directory may be created");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

// ============================================================================
// End-to-end run
// ============================================================================

#[test]
fn test_full_run_writes_every_table() {
    let dir = TempDir::new().unwrap();
    let report = run("sales_small.csv", dir.path());

    assert_eq!(report.overview.rows, 10);
    assert_eq!(report.overview.columns, 11);
    assert_eq!(report.duplicates_removed, 2);
    assert_eq!(report.rows_after_cleaning, 8);

    let names: Vec<&str> = report.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "cleaned_amazon.csv",
            "dataset_description.csv",
            "correlation_matrix.csv",
            "top_products_by_revenue.csv",
        ]
    );
    for table in &report.tables {
        assert!(table.path.is_file(), "{} missing", table.path.display());
        assert!(table.path.starts_with(dir.path().join("data")));
    }
}

#[test]
fn test_cleaned_dataset_has_no_nulls() {
    let dir = TempDir::new().unwrap();
    run("sales_small.csv", dir.path());

    let cleaned = read_csv(&dir.path().join("data/cleaned_amazon.csv"));
    assert_eq!(cleaned.height(), 8);
    for column in cleaned.get_columns() {
        assert_eq!(column.null_count(), 0, "nulls left in '{}'", column.name());
    }

    for derived in ["delivery_days", "review_delay_days", "review_length", "price_per_item"] {
        assert!(cleaned.column(derived).is_ok(), "'{}' not derived", derived);
    }
}

#[test]
fn test_imputed_values() {
    let dir = TempDir::new().unwrap();
    run("sales_small.csv", dir.path());
    let cleaned = read_csv(&dir.path().join("data/cleaned_amazon.csv"));

    // Row order after dedupe: P1, P2, P3, P4, P5, P6, P1, P7
    assert_eq!(text_cell(&cleaned, "product_id", 2), "P3");
    // median of 12, 15.5, 20, 40, 100, 100, 250
    assert_eq!(number_cell(&cleaned, "price", 2), 40.0);
    assert_eq!(text_cell(&cleaned, "review_text", 2), "Unknown");

    assert_eq!(text_cell(&cleaned, "product_id", 3), "P4");
    assert_eq!(text_cell(&cleaned, "category", 3), "Unknown");
    // zero quantity divides by one
    assert_eq!(number_cell(&cleaned, "price_per_item", 3), 31.0);

    // padding trimmed before duplicates were compared
    assert_eq!(text_cell(&cleaned, "category", 1), "Books");
    // 2024-01-01 -> 2024-01-04
    assert_eq!(number_cell(&cleaned, "delivery_days", 0), 3.0);
}

#[test]
fn test_missing_values_reported_before_imputation() {
    let dir = TempDir::new().unwrap();
    let report = run("sales_small.csv", dir.path());

    let nulls = |column: &str| {
        report
            .missing_values
            .iter()
            .find(|m| m.column == column)
            .map(|m| m.nulls)
    };
    assert_eq!(nulls("price"), Some(1));
    assert_eq!(nulls("category"), Some(1));
    assert_eq!(nulls("ship_date"), Some(1));
    assert_eq!(nulls("delivery_days"), Some(1));
    assert_eq!(nulls("product_id"), Some(0));

    assert!(report.imputations.iter().any(|r| r.column == "price"));
}

#[test]
fn test_every_chart_is_attempted_in_order() {
    let dir = TempDir::new().unwrap();
    let report = run("sales_small.csv", dir.path());

    let names: Vec<&str> = report.charts.iter().map(|c| c.chart()).collect();
    assert_eq!(
        names,
        vec![
            "price_distribution",
            "quantity_distribution",
            "total_amount_distribution",
            "shipping_cost_distribution",
            "rating_distribution",
            "delivery_days_distribution",
            "correlation_heatmap",
            "top_categories",
            "rating_counts",
            "review_length_by_rating",
            "price_vs_rating",
        ]
    );

    for outcome in &report.charts {
        match outcome {
            ChartOutcome::Written { path, .. } => {
                assert!(path.is_file());
                assert!(path.starts_with(dir.path().join("plots")));
            }
            // rendering needs system fonts; a failure must still be isolated
            ChartOutcome::Failed { .. } => {}
            ChartOutcome::Skipped { chart, .. } => panic!("'{}' should not be skipped", chart),
        }
    }

    let leftovers: Vec<_> = fs::read_dir(dir.path().join("plots"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains(".partial"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_all_derived_steps_applied() {
    let dir = TempDir::new().unwrap();
    let report = run("sales_small.csv", dir.path());

    for step in [
        "delivery_days",
        "review_delay_days",
        "review_length",
        "price_per_item",
        "top_products",
    ] {
        let outcome = report.step(step).unwrap();
        assert!(outcome.is_applied(), "'{}' was not applied", step);
    }
}

// ============================================================================
// Conditional columns
// ============================================================================

#[test]
fn test_missing_category_skips_dependent_outputs() {
    let dir = TempDir::new().unwrap();
    let report = run("no_category.csv", dir.path());

    assert_eq!(
        report.chart("top_categories"),
        Some(&ChartOutcome::Skipped {
            chart: "top_categories".to_string(),
            missing_columns: vec!["category".to_string()],
        })
    );
    assert_eq!(
        report.step("delivery_days"),
        Some(&StepOutcome::Skipped {
            step: "delivery_days".to_string(),
            missing_columns: vec!["order_date".to_string(), "ship_date".to_string()],
        })
    );
    assert!(report.step("review_length").unwrap().is_applied());
    assert!(!dir.path().join("plots/top_categories.svg").exists());
}

// ============================================================================
// Non-finite numbers
// ============================================================================

#[test]
fn test_nan_and_inf_are_imputed_and_charts_finish() {
    let dir = TempDir::new().unwrap();
    let report = run("non_finite.csv", dir.path());

    let nulls = |column: &str| {
        report
            .missing_values
            .iter()
            .find(|m| m.column == column)
            .map(|m| m.nulls)
    };
    assert_eq!(nulls("price"), Some(1));
    assert_eq!(nulls("total_amount"), Some(1));

    let cleaned = read_csv(&dir.path().join("data/cleaned_amazon.csv"));
    // medians of the finite values: price 9.5, 3, 4; total_amount 19, 20, 8
    assert_eq!(number_cell(&cleaned, "price", 1), 4.0);
    assert_eq!(number_cell(&cleaned, "total_amount", 2), 19.0);
    for name in ["price", "total_amount", "price_per_item"] {
        for row in 0..cleaned.height() {
            let value = number_cell(&cleaned, name, row);
            assert!(value.is_finite(), "{}[{}] is {}", name, row, value);
        }
    }

    // every chart reached an outcome; only the column-gated ones are skipped
    let skipped: Vec<&str> = report
        .charts
        .iter()
        .filter(|c| c.is_skipped())
        .map(|c| c.chart())
        .collect();
    assert_eq!(skipped, vec!["top_categories", "review_length_by_rating"]);
    assert_eq!(report.charts.last().unwrap().chart(), "price_vs_rating");
}

// ============================================================================
// Top products
// ============================================================================

#[test]
fn test_top_products_by_revenue() {
    let dir = TempDir::new().unwrap();
    run("top_products.csv", dir.path());

    let top = read_csv(&dir.path().join("data/top_products_by_revenue.csv"));
    let columns: Vec<&str> = top.get_column_names().iter().map(|c| c.as_str()).collect();
    assert_eq!(
        columns,
        vec!["product_id", "total_revenue", "total_qty", "avg_rating"]
    );
    assert_eq!(top.height(), 2);

    assert_eq!(text_cell(&top, "product_id", 0), "P1");
    assert_eq!(number_cell(&top, "total_revenue", 0), 30.0);
    assert_eq!(number_cell(&top, "total_qty", 0), 3.0);
    assert_eq!(number_cell(&top, "avg_rating", 0), 4.5);
    assert_eq!(text_cell(&top, "product_id", 1), "P2");
}

// ============================================================================
// Library stages
// ============================================================================

#[test]
fn test_cleaning_is_idempotent_on_fixture() {
    let raw = load_dataset(fixtures_path().join("sales_small.csv")).unwrap();
    let cleaner = DataCleaner::new();

    let once = cleaner.clean(&raw).unwrap();
    let twice = cleaner.clean(&once.df).unwrap();

    assert_eq!(twice.duplicates_removed, 0);
    assert!(once.df.equals_missing(&twice.df));
}

#[test]
fn test_scatter_sample_bound() {
    for rows in [0usize, 10, 2000, 2001, 50_000] {
        let picked = sample_indices(rows, 2000, None);
        assert_eq!(picked.len(), rows.min(2000));
    }
}

// ============================================================================
// Report and progress
// ============================================================================

#[test]
fn test_emit_report_and_progress() {
    let dir = TempDir::new().unwrap();
    let config = EdaConfig::builder()
        .input_path(fixtures_path().join("no_category.csv"))
        .output_dir(dir.path())
        .emit_report(true)
        .build()
        .unwrap();

    let stages = Arc::new(Mutex::new(Vec::new()));
    let seen = stages.clone();
    let report = Pipeline::builder()
        .config(config)
        .on_progress(move |update| seen.lock().unwrap().push(update.stage))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("eda_report.json")).unwrap())
            .unwrap();
    assert_eq!(json["rows_after_cleaning"], report.rows_after_cleaning);
    assert_eq!(json["charts"].as_array().unwrap().len(), report.charts.len());

    let stages = stages.lock().unwrap();
    assert_eq!(stages.first(), Some(&EdaStage::Loading));
    assert_eq!(stages.last(), Some(&EdaStage::Complete));
    assert!(stages.contains(&EdaStage::Charting));
}
