//! Error types for the storage module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while staging, storing or serving downloads.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Requested file is not in the download directory.
    #[error("Stored file not found: {filename}")]
    StoredFileMissing { filename: String },

    /// Staged file produced by a backend is gone.
    #[error("Staged file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Failed to create the download or staging directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to move the staged file into place.
    #[error("Failed to place {source_path} into {destination}")]
    PlacementFailed {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Every candidate name was taken.
    #[error("No free filename for {base}")]
    NameExhausted { base: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn missing(filename: impl Into<String>) -> Self {
        Self::StoredFileMissing {
            filename: filename.into(),
        }
    }

    /// Whether this is the not-found condition of the retrieval endpoint.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::StoredFileMissing { .. })
    }
}
