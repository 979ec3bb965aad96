//! Dataset loading and output directory handling.
//!
//! The input must exist before anything else happens: a missing file is
//! reported as [`EdaError::DatasetNotFound`] without touching the filesystem.

use crate::error::{EdaError, Result, ResultExt};
use crate::schema::{Capabilities, columns};
use crate::types::{DatasetOverview, MissingCount};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rows scanned when inferring column types.
const INFER_SCHEMA_ROWS: usize = 10_000;

/// Read a delimited file with a header row into a table.
///
/// Column types are inferred. If inference trips over a stray value the
/// file is read again with every column as text; numeric coercion later in
/// the pipeline turns the recognized columns back into numbers.
pub fn load_dataset(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(EdaError::DatasetNotFound(path.to_path_buf()));
    }

    let df = match read_csv(path, Some(INFER_SCHEMA_ROWS)) {
        Ok(df) => df,
        Err(e) => {
            debug!("Typed loading failed, retrying as text: {}", e);
            read_csv(path, Some(0)).map_err(|e| EdaError::MalformedDataset {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        }
    };

    let df = text_columns_as_string(df)?;
    info!("Loaded {} rows x {} columns from {}", df.height(), df.width(), path.display());
    Ok(df)
}

fn read_csv(path: &Path, infer_rows: Option<usize>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_rows)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
}

/// Identifier and free-text columns stay text even when they look numeric.
fn text_columns_as_string(mut df: DataFrame) -> Result<DataFrame> {
    for name in columns::TEXT_COLUMNS {
        let Ok(column) = df.column(name) else {
            continue;
        };
        if column.dtype() != &DataType::String {
            let casted = column
                .as_materialized_series()
                .cast(&DataType::String)
                .context(format!("Holding '{}' as text", name))?;
            df.replace(name, casted)?;
            debug!("Column '{}' held as text", name);
        }
    }
    Ok(df)
}

/// Create a directory and its parents. Succeeds if it already exists.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::create_dir_all(path)
        .map_err(|e| EdaError::write_failed(path, format!("cannot create directory: {}", e)))
}

/// Shape and dtypes of a table.
pub fn overview(df: &DataFrame) -> DatasetOverview {
    DatasetOverview {
        rows: df.height(),
        columns: df.width(),
        dtypes: df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.dtype().to_string()))
            .collect(),
    }
}

/// Null count of every column, in table order.
pub fn missing_values(df: &DataFrame) -> Vec<MissingCount> {
    df.get_columns()
        .iter()
        .map(|c| MissingCount {
            column: c.name().to_string(),
            nulls: c.null_count(),
        })
        .collect()
}

/// Log shape and column kinds at info, dtypes at debug.
pub fn log_overview(df: &DataFrame) {
    let caps = Capabilities::of(df);
    info!(
        "Dataset: {} rows, {} numeric / {} text / {} datetime columns",
        df.height(),
        caps.numeric_columns().len(),
        caps.text_columns().len(),
        caps.datetime_columns().len()
    );
    for column in df.get_columns() {
        debug!("  {}: {}", column.name(), column.dtype());
    }
}
