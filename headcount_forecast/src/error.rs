//! Error types for the headcount_forecast crate

use thiserror::Error;

/// Custom error types for the headcount_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error raised by a model while fitting or forecasting
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The selected department/region has too little history to forecast
    #[error("Insufficient data for {department} ({region}): {reason}")]
    InsufficientData {
        department: String,
        region: String,
        reason: String,
    },

    /// Both the primary and the fallback model failed
    #[error("Fallback model failed after primary failure (primary: {primary}; fallback: {fallback})")]
    FallbackFailed { primary: String, fallback: String },

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from reading or writing CSV tables
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Error from loading configuration
    #[error("Config error: {0}")]
    ConfigError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::CsvError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

impl From<tempfile::PersistError> for ForecastError {
    fn from(err: tempfile::PersistError) -> Self {
        ForecastError::IoError(err.error)
    }
}
