//! Output writing.
//!
//! Tables land in `<output>/data/` as comma separated files with a header
//! row. The optional run report is `<output>/eda_report.json`. Every file is
//! written to a hidden `.partial` sibling and renamed into place, so a failed
//! write never clobbers an earlier artifact.

mod generator;

pub use generator::{
    CLEANED_DATASET, CORRELATION_MATRIX, DATASET_DESCRIPTION, REPORT_FILE, ReportGenerator,
    SummaryTables, TOP_PRODUCTS,
};
