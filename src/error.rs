// src/error.rs

use serde_json::Error as SerdeError;
use std::io;
use thiserror::Error;

/// Custom error types for the application
#[derive(Error, Debug)]
pub enum AppError {
    /// Metadata lookup failed (network, invalid URL, private or removed content).
    /// The engine's own text is kept verbatim for display.
    #[error("Metadata fetch error: {0}")]
    MetadataFetch(String),

    /// Illegal status transition or removal of a non-pending item.
    /// Indicates a caller defect rather than a user-facing condition.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Failure during an active download
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Error for missing dependencies
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    /// Error for invalid input validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] SerdeError),

    /// Path or directory related errors
    #[error("Path error: {0}")]
    PathError(String),

    /// General application errors
    #[error("Application error: {0}")]
    General(String),
}

/// Outcome of a download that did not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    /// The cancellation flag was observed while the download was in flight
    #[error("cancelled")]
    Cancelled,

    /// Any other failure: network, disk, unsupported format/quality combination
    #[error("{0}")]
    Engine(String),
}

/// Convert a string error to AppError::General
impl From<String> for AppError {
    fn from(error: String) -> Self {
        AppError::General(error)
    }
}

/// Convert a &str error to AppError::General
impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::General(error.to_string())
    }
}
