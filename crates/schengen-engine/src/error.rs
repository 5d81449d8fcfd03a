//! Error types for schengen-engine operations.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A stay (or planned trip) whose entry date falls after its exit date.
    #[error("Invalid stay: entry {entry} is after exit {exit}")]
    InvertedStay { entry: NaiveDate, exit: NaiveDate },

    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Unknown export format: '{0}' (expected 'json' or 'csv')")]
    UnknownExportFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
