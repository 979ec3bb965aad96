use crate::schema::StepOutcome;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of one EDA run.
///
/// Returned by [`Pipeline::run`](crate::Pipeline::run) and, when enabled,
/// written as `eda_report.json` in the output root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdaReport {
    /// Input dataset that was analyzed.
    pub input_path: PathBuf,

    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Shape and column types right after loading.
    pub overview: DatasetOverview,

    /// Number of rows after cleaning.
    pub rows_after_cleaning: usize,
    /// Number of exact duplicate rows removed.
    pub duplicates_removed: usize,

    /// Cleaning, coercion and imputation actions, in the order they ran.
    pub actions: Vec<EdaAction>,

    /// Optional derivation steps and whether they ran.
    pub steps: Vec<StepOutcome>,

    /// Null counts per column after derivation, before imputation.
    pub missing_values: Vec<MissingCount>,

    /// Per-column imputation details.
    pub imputations: Vec<ImputationRecord>,

    /// Derived tables that were written.
    pub tables: Vec<ArtifactRecord>,

    /// Outcome of every chart in rendering order.
    pub charts: Vec<ChartOutcome>,

    /// Recovered problems worth surfacing.
    pub warnings: Vec<String>,
}

impl EdaReport {
    /// Create an empty report for the given input.
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            duration_ms: 0,
            overview: DatasetOverview::default(),
            rows_after_cleaning: 0,
            duplicates_removed: 0,
            actions: Vec::new(),
            steps: Vec::new(),
            missing_values: Vec::new(),
            imputations: Vec::new(),
            tables: Vec::new(),
            charts: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_action(&mut self, action: EdaAction) {
        self.actions.push(action);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Charts that ended up on disk.
    pub fn charts_written(&self) -> usize {
        self.charts
            .iter()
            .filter(|c| matches!(c, ChartOutcome::Written { .. }))
            .count()
    }

    /// Charts that failed to render.
    pub fn charts_failed(&self) -> usize {
        self.charts
            .iter()
            .filter(|c| matches!(c, ChartOutcome::Failed { .. }))
            .count()
    }

    /// Look up the outcome of a chart by name.
    pub fn chart(&self, name: &str) -> Option<&ChartOutcome> {
        self.charts.iter().find(|c| c.chart() == name)
    }

    /// Look up an optional step by name.
    pub fn step(&self, name: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step() == name)
    }
}

/// Shape and schema of the loaded dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub rows: usize,
    pub columns: usize,
    /// `(name, dtype)` pairs in table order.
    pub dtypes: Vec<(String, String)>,
}

/// Nulls in one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingCount {
    pub column: String,
    pub nulls: usize,
}

/// How one column had its nulls filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationRecord {
    pub column: String,
    pub method: ImputationMethod,
    pub filled: usize,
    /// Fill value rendered as text.
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationMethod {
    /// Median of the non-null numeric values.
    Median,
    /// Numeric column without any value; filled with zero.
    Zero,
    /// Median timestamp of the column.
    MedianTimestamp,
    /// The literal `"Unknown"`.
    Unknown,
}

/// A single action taken while preparing the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdaAction {
    pub action_type: ActionType,
    /// Column name, or "dataset".
    pub target: String,
    pub description: String,
}

impl EdaAction {
    pub fn new(action_type: ActionType, target: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Whitespace was trimmed from text cells.
    TextTrimmed,
    /// Exact duplicate rows were removed.
    DuplicatesRemoved,
    /// A text column was parsed into datetimes.
    DateParsed,
    /// A column was coerced to numbers.
    NumericCoerced,
    /// A new column was derived.
    FeatureDerived,
    /// Missing values were filled.
    ValueImputed,
}

impl ActionType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TextTrimmed => "Text Trimmed",
            Self::DuplicatesRemoved => "Duplicates Removed",
            Self::DateParsed => "Date Parsed",
            Self::NumericCoerced => "Numeric Coerced",
            Self::FeatureDerived => "Feature Derived",
            Self::ValueImputed => "Value Imputed",
        }
    }
}

/// A derived table on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub name: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// What happened to one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartOutcome {
    Written { chart: String, path: PathBuf },
    Skipped { chart: String, missing_columns: Vec<String> },
    Failed { chart: String, reason: String },
}

impl ChartOutcome {
    pub fn chart(&self) -> &str {
        match self {
            Self::Written { chart, .. } | Self::Skipped { chart, .. } | Self::Failed { chart, .. } => {
                chart
            }
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Written { path, .. } => Some(path),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = EdaReport::new("sales.csv");
        report.charts = vec![
            ChartOutcome::Written {
                chart: "price_distribution".to_string(),
                path: PathBuf::from("plots/price_distribution.png"),
            },
            ChartOutcome::Skipped {
                chart: "top_categories".to_string(),
                missing_columns: vec!["category".to_string()],
            },
            ChartOutcome::Failed {
                chart: "correlation_heatmap".to_string(),
                reason: "font unavailable".to_string(),
            },
        ];

        assert_eq!(report.charts_written(), 1);
        assert_eq!(report.charts_failed(), 1);
        assert!(report.chart("top_categories").unwrap().is_skipped());
        assert!(report.chart("missing").is_none());
        assert_eq!(
            report.chart("price_distribution").unwrap().path(),
            Some(&PathBuf::from("plots/price_distribution.png"))
        );
    }

    #[test]
    fn test_action_type_display_name() {
        assert_eq!(ActionType::DuplicatesRemoved.display_name(), "Duplicates Removed");
        assert_eq!(ActionType::ValueImputed.display_name(), "Value Imputed");
    }

    #[test]
    fn test_action_types_serialize_snake_case() {
        let pairs = [
            (ActionType::TextTrimmed, "\"text_trimmed\""),
            (ActionType::DuplicatesRemoved, "\"duplicates_removed\""),
            (ActionType::DateParsed, "\"date_parsed\""),
            (ActionType::NumericCoerced, "\"numeric_coerced\""),
            (ActionType::FeatureDerived, "\"feature_derived\""),
            (ActionType::ValueImputed, "\"value_imputed\""),
        ];
        for (action_type, expected) in pairs {
            let json = serde_json::to_string(&action_type).expect("Should serialize");
            assert_eq!(json, expected);
        }
    }

    #[test]
    fn test_report_json_roundtrip() {
        let mut report = EdaReport::new("sales.csv");
        report.duplicates_removed = 2;
        report.add_action(EdaAction::new(
            ActionType::DuplicatesRemoved,
            "dataset",
            "Removed 2 duplicate rows",
        ));
        report.steps.push(StepOutcome::skipped(
            "delivery_days",
            vec!["ship_date".to_string()],
        ));

        let json = serde_json::to_string(&report).expect("Should serialize");
        assert!(json.contains("\"status\":\"skipped\""));

        let back: EdaReport = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(back.duplicates_removed, 2);
        assert_eq!(back.actions.len(), 1);
        assert!(!back.step("delivery_days").unwrap().is_applied());
    }
}
