/// Error types for the weather station crates
use std::time::Duration;
use thiserror::Error;

/// Main error type for store, query and derived-view operations
#[derive(Error, Debug)]
pub enum WxError {
    /// Opening the store or running a statement failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A store call ran past its deadline and was interrupted
    #[error("Store call exceeded its {0:?} deadline")]
    Timeout(Duration),

    /// A timestamp literal could not be parsed
    #[error("Failed to parse timestamp: {0}")]
    Parse(String),

    /// An explicit end literal that falls before the resolved start
    #[error("Window end {end} precedes start {start}")]
    InvertedWindow { start: String, end: String },

    /// A column name outside the known vocabulary
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// The parameter is known but the operation has no meaning for it
    #[error("Parameter '{parameter}' is not supported by {operation}")]
    UnsupportedParameter {
        parameter: String,
        operation: &'static str,
    },

    /// An ingestion record without a timestamp
    #[error("Record has no timestamp")]
    MissingTimestamp,

    /// The harvest grid resource is malformed
    #[error("Invalid harvest grid: {0}")]
    Grid(String),

    /// Failed to parse CSV input
    #[error("Failed to parse CSV: {0}")]
    Csv(String),

    /// Reading a resource from disk failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using WxError
pub type Result<T> = std::result::Result<T, WxError>;
