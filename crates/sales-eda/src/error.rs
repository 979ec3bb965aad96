//! Custom error types for the EDA pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Cell-level
//! coercion failures are not errors: they become nulls and are imputed later.
//!
//! Errors are serializable so the run report (and `--json` output) can carry
//! them as `{ code, message }` pairs.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the EDA pipeline.
#[derive(Error, Debug)]
pub enum EdaError {
    /// The input dataset does not exist. Nothing is produced.
    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    /// The input exists but could not be parsed as a delimited table.
    #[error("Malformed dataset '{}': {reason}", path.display())]
    MalformedDataset { path: PathBuf, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A single chart could not be rendered or persisted.
    #[error("Failed to render chart '{chart}': {reason}")]
    RenderFailed { chart: String, reason: String },

    /// A derived table or image could not be written.
    #[error("Failed to write '{}': {reason}", path.display())]
    OutputWriteFailed { path: PathBuf, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EdaError>,
    },
}

impl EdaError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EdaError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a render failure of the named chart.
    pub fn render(chart: impl Into<String>, reason: impl ToString) -> Self {
        EdaError::RenderFailed {
            chart: chart.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a failed artifact write.
    pub fn write_failed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        EdaError::OutputWriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Get a stable error code for report consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DatasetNotFound(_) => "DATASET_NOT_FOUND",
            Self::MalformedDataset { .. } => "MALFORMED_DATASET",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::RenderFailed { .. } => "RENDER_FAILED",
            Self::OutputWriteFailed { .. } => "OUTPUT_WRITE_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error represents a missing input dataset.
    pub fn is_dataset_not_found(&self) -> bool {
        match self {
            Self::DatasetNotFound(_) => true,
            Self::WithContext { source, .. } => source.is_dataset_not_found(),
            _ => false,
        }
    }

    /// Check if the pipeline can carry on after this error.
    ///
    /// Only per-chart render failures are recoverable; everything else halts
    /// the run.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::RenderFailed { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for EdaError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EdaError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for EDA operations.
pub type Result<T> = std::result::Result<T, EdaError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EdaError::Polars(e).with_context(context))
    }
}
