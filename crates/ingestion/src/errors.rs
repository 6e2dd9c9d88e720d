//! Ingestion error types

use apit_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Unsupported document extension: {0:?}")]
    UnsupportedExtension(String),

    #[error("Converter {program} could not be started: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Converter exited with {status}: {stderr}")]
    ConversionFailed { status: String, stderr: String },

    #[error("Converter timed out after {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },

    #[error("Converter produced no output at {path}")]
    MissingOutput { path: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        AppError::Storage {
            message: e.to_string(),
        }
    }
}
