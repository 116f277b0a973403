//! Error types for the backend orchestrator.

use thiserror::Error;

use super::types::BackendFailure;
use crate::backend::BackendErrorKind;
use crate::storage::StorageError;

/// Terminal outcome of a failed retrieval.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The request was rejected before any backend ran.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Every configured backend failed.
    #[error("All backends failed: {}", describe(.failures))]
    AllBackendsFailed { failures: Vec<BackendFailure> },

    /// The download succeeded but could not be stored.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl RetrievalError {
    /// Message safe to show to the person who submitted the URL.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::AllBackendsFailed { failures } => {
                let lead = match failures.len() {
                    1 => "The download attempt failed".to_string(),
                    2 => "Both attempts failed".to_string(),
                    n => format!("All {} attempts failed", n),
                };
                let mut message = format!(
                    "{}; the video may be private, restricted, or blocked.",
                    lead
                );
                if let Some(hint) = cause_hint(failures) {
                    message.push(' ');
                    message.push_str(hint);
                }
                message
            }
            Self::Storage(_) => {
                "The video was downloaded but could not be saved on the server.".to_string()
            }
        }
    }

    /// Coarse label for metrics.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::AllBackendsFailed { .. } => "all_failed",
            Self::Storage(_) => "storage",
        }
    }
}

fn describe(failures: &[BackendFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({}): {}", f.backend, f.kind.as_str(), f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Hint for the most specific cause among the failures.
fn cause_hint(failures: &[BackendFailure]) -> Option<&'static str> {
    let has = |kind: BackendErrorKind| failures.iter().any(|f| f.kind == kind);

    if has(BackendErrorKind::AuthenticationRequired) {
        Some("The site asked for sign-in or age verification; the server's cookies may be missing or expired.")
    } else if has(BackendErrorKind::NoCompatibleStream) {
        Some("No stream with both audio and video was offered in the requested format.")
    } else if has(BackendErrorKind::TimedOut) {
        Some("The download took too long and was stopped.")
    } else if has(BackendErrorKind::ExtractionFailed) {
        Some("The site may have changed or blocked the request; the download tools may need an update.")
    } else if has(BackendErrorKind::Unavailable) {
        Some("The download tools are not installed on the server.")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(backend: &str, kind: BackendErrorKind) -> BackendFailure {
        BackendFailure {
            backend: backend.to_string(),
            kind,
            reason: format!("{} broke", backend),
        }
    }

    #[test]
    fn test_both_failed_message() {
        let err = RetrievalError::AllBackendsFailed {
            failures: vec![
                failure("yt_dlp", BackendErrorKind::ExtractionFailed),
                failure("you_get", BackendErrorKind::ExtractionFailed),
            ],
        };
        let message = err.user_message();
        assert!(message.starts_with(
            "Both attempts failed; the video may be private, restricted, or blocked."
        ));
        assert!(message.contains("may need an update"));
        assert!(!message.contains("broke"));
    }

    #[test]
    fn test_auth_hint_wins() {
        let err = RetrievalError::AllBackendsFailed {
            failures: vec![
                failure("yt_dlp", BackendErrorKind::AuthenticationRequired),
                failure("you_get", BackendErrorKind::NoCompatibleStream),
            ],
        };
        assert!(err.user_message().contains("sign-in"));
    }

    #[test]
    fn test_display_names_every_backend() {
        let err = RetrievalError::AllBackendsFailed {
            failures: vec![
                failure("yt_dlp", BackendErrorKind::TimedOut),
                failure("you_get", BackendErrorKind::Unavailable),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("yt_dlp (timed_out): yt_dlp broke"));
        assert!(text.contains("you_get (unavailable): you_get broke"));
    }

    #[test]
    fn test_single_and_many_attempts() {
        let one = RetrievalError::AllBackendsFailed {
            failures: vec![failure("yt_dlp", BackendErrorKind::Io)],
        };
        assert_eq!(
            one.user_message(),
            "The download attempt failed; the video may be private, restricted, or blocked."
        );

        let three = RetrievalError::AllBackendsFailed {
            failures: vec![
                failure("a", BackendErrorKind::Io),
                failure("b", BackendErrorKind::Io),
                failure("c", BackendErrorKind::Io),
            ],
        };
        assert!(three.user_message().starts_with("All 3 attempts failed"));
    }

    #[test]
    fn test_validation_message() {
        let err = RetrievalError::Validation("Please enter a video URL.".to_string());
        assert_eq!(err.user_message(), "Please enter a video URL.");
        assert_eq!(err.metric_label(), "validation");
    }
}
