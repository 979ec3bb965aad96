use crate::config::EdaConfig;
use crate::error::{EdaError, Result, ResultExt};
use crate::loader::ensure_dir;
use crate::types::{ArtifactRecord, EdaReport};
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CLEANED_DATASET: &str = "cleaned_amazon.csv";
pub const DATASET_DESCRIPTION: &str = "dataset_description.csv";
pub const CORRELATION_MATRIX: &str = "correlation_matrix.csv";
pub const TOP_PRODUCTS: &str = "top_products_by_revenue.csv";
pub const REPORT_FILE: &str = "eda_report.json";

/// Summary tables handed to [`ReportGenerator::write_tables`].
pub struct SummaryTables {
    pub description: DataFrame,
    pub correlation: Option<DataFrame>,
    pub top_products: Option<DataFrame>,
}

/// Writes the derived tables and the optional JSON run report.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
    data_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(&EdaConfig::default())
    }
}

impl ReportGenerator {
    pub fn new(config: &EdaConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            data_dir: config.data_dir(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Write one table as comma separated text with a header row.
    pub fn write_table(&self, df: &DataFrame, file_name: &str) -> Result<ArtifactRecord> {
        ensure_dir(&self.data_dir)?;
        let path = self.data_dir.join(file_name);

        let mut table = df.clone();
        write_atomically(&path, |file| {
            CsvWriter::new(file)
                .include_header(true)
                .with_separator(b',')
                .with_quote_char(b'"')
                .finish(&mut table)
                .context(format!("Encoding {}", file_name))
        })?;

        info!("Table saved: {} ({} rows)", path.display(), df.height());
        Ok(ArtifactRecord {
            name: file_name.to_string(),
            path,
            rows: df.height(),
        })
    }

    /// Write the cleaned table followed by every summary table that exists.
    pub fn write_tables(
        &self,
        cleaned: &DataFrame,
        summary: &SummaryTables,
    ) -> Result<Vec<ArtifactRecord>> {
        let mut records = vec![
            self.write_table(cleaned, CLEANED_DATASET)?,
            self.write_table(&summary.description, DATASET_DESCRIPTION)?,
        ];

        match &summary.correlation {
            Some(table) => records.push(self.write_table(table, CORRELATION_MATRIX)?),
            None => debug!("No correlation matrix to write"),
        }
        match &summary.top_products {
            Some(table) => records.push(self.write_table(table, TOP_PRODUCTS)?),
            None => debug!("No product aggregation to write"),
        }
        Ok(records)
    }

    /// Write the run report as pretty JSON under the output root.
    pub fn write_report(&self, report: &EdaReport) -> Result<PathBuf> {
        ensure_dir(&self.output_dir)?;
        let path = self.output_dir.join(REPORT_FILE);
        let json = serde_json::to_string_pretty(report)?;
        write_atomically(&path, |file| {
            file.write_all(json.as_bytes())?;
            Ok(())
        })?;

        info!("Report saved: {}", path.display());
        Ok(path)
    }
}

/// Write through a hidden `.partial` sibling, then rename over `path`.
///
/// On any failure the partial file is removed and whatever was at `path`
/// stays untouched.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| EdaError::write_failed(path, "not a file path"))?;
    let partial = path.with_file_name(format!(".{}.partial", file_name));

    let written = File::create(&partial)
        .map_err(EdaError::from)
        .and_then(|mut file| {
            write(&mut file)?;
            file.sync_all()?;
            Ok(())
        })
        .and_then(|_| fs::rename(&partial, path).map_err(EdaError::from));

    written.map_err(|e| {
        let _ = fs::remove_file(&partial);
        EdaError::write_failed(path, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn generator(dir: &TempDir) -> ReportGenerator {
        let config = EdaConfig::builder().output_dir(dir.path()).build().unwrap();
        ReportGenerator::new(&config)
    }

    #[test]
    fn test_write_table_with_header() {
        let dir = TempDir::new().unwrap();
        let generator = generator(&dir);
        let df = df![
            "product_id" => ["P1", "P2"],
            "total_revenue" => [30.0, 5.0],
        ]
        .unwrap();

        let record = generator.write_table(&df, TOP_PRODUCTS).unwrap();
        assert_eq!(record.rows, 2);
        assert_eq!(record.path, dir.path().join("data").join(TOP_PRODUCTS));

        let content = fs::read_to_string(&record.path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("product_id,total_revenue"));
        assert_eq!(lines.next(), Some("P1,30.0"));
    }

    #[test]
    fn test_optional_tables_are_skipped() {
        let dir = TempDir::new().unwrap();
        let generator = generator(&dir);
        let cleaned = df!["price" => [1.0]].unwrap();
        let summary = SummaryTables {
            description: df!["statistic" => ["count"], "price" => ["1"]].unwrap(),
            correlation: None,
            top_products: None,
        };

        let records = generator.write_tables(&cleaned, &summary).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![CLEANED_DATASET, DATASET_DESCRIPTION]);
        assert!(!generator.data_dir().join(CORRELATION_MATRIX).exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("table.csv");
        fs::write(&target, "old").unwrap();

        let err = write_atomically(&target, |_| Err(EdaError::InvalidConfig("boom".into())))
            .unwrap_err();
        assert_eq!(err.error_code(), "OUTPUT_WRITE_FAILED");
        assert_eq!(fs::read_to_string(&target).unwrap(), "old");
        assert!(!dir.path().join(".table.csv.partial").exists());
    }

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let generator = generator(&dir);
        let report = EdaReport::new("sales.csv");

        let path = generator.write_report(&report).unwrap();
        assert_eq!(path, dir.path().join(REPORT_FILE));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["input_path"], "sales.csv");
    }
}
