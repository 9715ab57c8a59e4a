//! Error types for amnesia.

use std::path::PathBuf;

use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::sqlite;

/// Main error type for amnesia operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The database file or its schema does not exist yet.
    #[error("Database not initialized: {} (run 'amnesia init' to create it)", .0.display())]
    NotInitialized(PathBuf),

    /// A vector's length disagrees with the vector index dimension.
    #[error("Dimension mismatch: expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding provider failed or returned malformed output.
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Direct lookup miss.
    #[error("Memory not found: {0}")]
    NotFound(String),

    /// Missing or out-of-range input.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Storage layer failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Session export failure.
    #[error("Transcript export error: {0}")]
    Transcript(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sqlite::Error> for Error {
    fn from(err: sqlite::Error) -> Self {
        match err {
            sqlite::Error::NotInitialized(path) => Error::NotInitialized(path),
            sqlite::Error::MismatchedDimensions { expected, actual } => {
                Error::DimensionMismatch { expected, actual }
            }
            sqlite::Error::InvalidEmbedding(msg) => {
                Error::Embedding(EmbeddingError::Malformed(msg))
            }
            sqlite::Error::InvalidLimit(msg) => Error::Validation(msg),
            sqlite::Error::InvalidDimension(dims) => {
                Error::Validation(format!("vector dimension must be greater than 0, got {dims}"))
            }
            other => Error::Storage(other.to_string()),
        }
    }
}
