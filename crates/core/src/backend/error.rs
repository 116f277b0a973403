//! Error types for retrieval backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stream::{ContainerFormat, SelectionError};

/// Errors from a single backend invocation.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend ran but nothing it offered matched the selection policy.
    #[error("No compatible {container} stream offered")]
    NoCompatibleStream { container: ContainerFormat },

    /// The backend's own processing failed (site changes, blocks, bad output).
    #[error("Extraction failed: {reason}")]
    ExtractionFailed { reason: String },

    /// The site asked for a signed-in session or bot verification.
    #[error("Authentication required or invalid: {reason}")]
    AuthenticationRequiredOrInvalid { reason: String },

    /// The invocation exceeded the configured bound and was stopped.
    #[error("Timed out after {timeout_secs} seconds")]
    TimedOut { timeout_secs: u64 },

    /// The backend's tool is not installed or not executable.
    #[error("Backend unavailable: {reason}")]
    Unavailable { reason: String },

    /// I/O error while staging the download.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    pub fn extraction_failed(reason: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            reason: reason.into(),
        }
    }

    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::AuthenticationRequiredOrInvalid {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> BackendErrorKind {
        match self {
            Self::NoCompatibleStream { .. } => BackendErrorKind::NoCompatibleStream,
            Self::ExtractionFailed { .. } => BackendErrorKind::ExtractionFailed,
            Self::AuthenticationRequiredOrInvalid { .. } => BackendErrorKind::AuthenticationRequired,
            Self::TimedOut { .. } => BackendErrorKind::TimedOut,
            Self::Unavailable { .. } => BackendErrorKind::Unavailable,
            Self::Io(_) => BackendErrorKind::Io,
        }
    }
}

impl From<SelectionError> for BackendError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::NoCompatibleStream { container } => {
                Self::NoCompatibleStream { container }
            }
        }
    }
}

/// Coarse failure category, used for metrics labels and user-facing hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    NoCompatibleStream,
    ExtractionFailed,
    AuthenticationRequired,
    TimedOut,
    Unavailable,
    Io,
}

impl BackendErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCompatibleStream => "no_compatible_stream",
            Self::ExtractionFailed => "extraction_failed",
            Self::AuthenticationRequired => "auth_required",
            Self::TimedOut => "timed_out",
            Self::Unavailable => "unavailable",
            Self::Io => "io",
        }
    }
}
