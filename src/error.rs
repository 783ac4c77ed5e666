//! Error types for the persistence edge of the add-on.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading or writing the persisted settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("settings namespace '{0}' is not a JSON object")]
    NotAnObject(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
