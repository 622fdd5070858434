use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Load-time failures
// ---------------------------------------------------------------------------

/// Failure to turn a source file into measurement records.
///
/// Always fatal for the load attempt: the cache keeps no partial table.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unreadable parquet file {path}: {message}")]
    Parquet { path: PathBuf, message: String },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path}, row {row}: column '{column}' has invalid value '{value}'")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("{path}, row {row}: '{value}' is not a recognised date")]
    InvalidDate {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("unsupported file extension '.{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },
}

// ---------------------------------------------------------------------------
// Criteria failures
// ---------------------------------------------------------------------------

/// Internally inconsistent filter criteria. Indicates a caller bug.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("date range is inverted: {min} > {max}")]
    InvertedDateRange { min: NaiveDate, max: NaiveDate },

    #[error("value range is inverted: {min} > {max}")]
    InvertedValueRange { min: f64, max: f64 },

    #[error("value range bound is NaN")]
    NanBound,
}
