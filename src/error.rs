//! Error types for the recipe-insights library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur in the recipe-insights library.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// CSV parsing or writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset download errors
    #[error("Download error: {0}")]
    Download(String),

    /// An input file is missing columns the loader requires
    #[error("Missing columns in {file}: {columns:?}")]
    MissingColumns {
        /// File that was read
        file: String,
        /// Columns that were expected but not found
        columns: Vec<String>,
    },

    /// A table does not have the shape an operation expects
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// A serialized list field could not be parsed
    #[error("Malformed list literal: {0}")]
    MalformedList(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with `InsightsError`
pub type Result<T> = std::result::Result<T, InsightsError>;

impl From<anyhow::Error> for InsightsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<reqwest::Error> for InsightsError {
    fn from(err: reqwest::Error) -> Self {
        Self::Download(err.to_string())
    }
}
