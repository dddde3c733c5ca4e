//! Error types for loading and aggregating search data.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised when observations cannot be aggregated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// An observation has no date, or only whitespace.
    #[error("observation {index} has no usable date")]
    MissingDate { index: usize },

    /// A rolling window must cover at least one observation.
    #[error("window size must be at least 1")]
    ZeroWindow,
}

/// Errors raised while reading a data file into observations.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be read.
    #[error("Error loading data: {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid CSV.
    #[error("Error parsing data: {0}")]
    Parse(#[from] csv::Error),

    /// The header row lacks a required column.
    #[error("Error parsing data: missing column `{0}`")]
    MissingColumn(&'static str),

    /// The parsed observations were rejected by the aggregator.
    #[error("Error processing data: {0}")]
    Validation(#[from] ValidationError),

    /// The background task doing the work failed.
    #[error("Error loading data: background task failed: {0}")]
    Task(String),
}

/// Errors raised while reading the dashboard configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}
