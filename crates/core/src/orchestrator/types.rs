//! Types for the backend orchestrator.

use serde::{Deserialize, Serialize};

use super::error::RetrievalError;
use crate::backend::BackendErrorKind;

/// A user's request to retrieve one video. Untrusted input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub url: String,
}

impl RetrievalRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Trimmed URL, or a validation error when nothing was supplied.
    pub fn validated_url(&self) -> Result<&str, RetrievalError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(RetrievalError::Validation(
                "Please enter a video URL.".to_string(),
            ));
        }
        Ok(url)
    }
}

/// A successfully stored download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub title: String,
    pub uploader: Option<String>,
    /// Bare filename inside the download directory.
    pub stored_filename: String,
    /// Name of the backend that produced the file.
    pub backend: String,
    pub size_bytes: u64,
    /// Label of the selected stream(s).
    pub selection: String,
    pub quality_downgrade: bool,
}

/// One failed backend invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendFailure {
    pub backend: String,
    pub kind: BackendErrorKind,
    pub reason: String,
}
