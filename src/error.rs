//! Error types for plantdata
//!
//! Cell-level quality problems never surface here: they are corrected in
//! place and counted in the [`QualityReport`](crate::QualityReport). What
//! remains are the structural failures that abort a run, the failures of
//! the file/archive collaborators, and configuration mistakes caught
//! before any data is touched.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Result type alias for plantdata operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for plantdata operations
#[derive(Error, Debug)]
pub enum Error {
    /// Structural failure inside the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Failure reading or extracting raw inputs
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Invalid static configuration or contract
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Terminal failures of a pipeline run.
///
/// No partial dataset is ever returned alongside one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A timestamp cell could not be parsed
    #[error("Malformed timestamp in source '{source_name}' at row {row}: '{value}'")]
    MalformedTimestamp {
        source_name: String,
        row: usize,
        value: String,
    },

    /// Timestamps still go backwards after deduplication
    #[error(
        "Source '{source_name}' cannot be aligned: timestamps are not monotonic{} at {timestamp}",
        entity_suffix(.entity)
    )]
    UnalignableSource {
        source_name: String,
        entity: Option<String>,
        timestamp: NaiveDateTime,
    },

    /// A source breaks the declared metadata contract
    #[error("Schema violation in source '{source_name}', field '{field}': {reason}")]
    SchemaViolation {
        source_name: String,
        field: String,
        reason: String,
    },

    /// An asset id cannot be reconciled across sources
    #[error("Entity reconciliation failed for asset '{asset_id}' (source '{source_name}')")]
    EntityReconciliation {
        asset_id: String,
        source_name: String,
    },
}

fn entity_suffix(entity: &Option<String>) -> String {
    entity
        .as_ref()
        .map(|e| format!(" for entity '{e}'"))
        .unwrap_or_default()
}

impl PipelineError {
    pub(crate) fn schema(
        source_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PipelineError::SchemaViolation {
            source_name: source_name.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors from the raw-input collaborators (files, archives)
#[derive(Error, Debug)]
pub enum LoadError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited file could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Zip archive could not be read or unpacked
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Contract or configuration JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected input file does not exist
    #[error("File not found: {0}")]
    MissingFile(String),

    /// A table has no header row
    #[error("Empty table: {0}")]
    EmptyTable(String),
}

/// Static configuration rejected before the run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Stuck-sensor window too short to mean anything
    #[error("Stuck window for '{field}' must be at least 2 samples, got {window}")]
    StuckWindowTooShort { field: String, window: usize },

    /// Range bounds are inverted or not finite
    #[error("Invalid range for '{field}': [{min}, {max}]")]
    InvalidRange { field: String, min: f64, max: f64 },

    /// Sampling period string could not be parsed
    #[error("Invalid sampling period: '{0}'")]
    InvalidPeriod(String),

    /// UTC offset string could not be parsed
    #[error("Invalid UTC offset: '{0}'")]
    InvalidOffset(String),

    /// Unit label is not one the integrator understands
    #[error("Unknown unit '{unit}' for '{field}'")]
    UnknownUnit { field: String, unit: String },

    /// Configuration refers to a source the contract does not declare
    #[error("Unknown source: {0}")]
    UnknownSource(String),
}
