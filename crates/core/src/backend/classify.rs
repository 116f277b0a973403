//! Structured classification of external tool failures.
//!
//! Raw tool output is turned into a [`BackendError`] right where the process
//! returns; nothing above this module inspects error text.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::io::ErrorKind;
use std::path::Path;

use super::error::BackendError;

/// Longest failure reason kept for logs and aggregate errors.
const MAX_REASON_CHARS: usize = 500;

/// Phrases the extractors print when a session or verification is needed.
static AUTH_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(not a bot|confirm your age|age[- ]restricted|inappropriate for some users|login required|\blog in\b|\bsign in\b|cookies|members[- ]only|private video|http error 40[13])",
    )
    .unwrap()
});

/// Classify a tool that exited unsuccessfully.
pub fn classify_failure(tool: &str, stderr: &str) -> BackendError {
    let reason = format!("{}: {}", tool, summarize(stderr));
    if AUTH_MARKERS.is_match(stderr) {
        BackendError::authentication(reason)
    } else {
        BackendError::extraction_failed(reason)
    }
}

/// Classify a failure to start the tool at all.
pub fn classify_spawn_error(program: &Path, err: std::io::Error) -> BackendError {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => {
            BackendError::unavailable(format!("{}: {}", program.display(), err))
        }
        _ => BackendError::Io(err),
    }
}

/// The most useful line of tool output: the last `ERROR:` line, else the last
/// non-empty line.
fn summarize(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let line = lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .copied()
        .unwrap_or("exited without output");

    let line = line.trim_start_matches("ERROR:").trim();
    if line.chars().count() > MAX_REASON_CHARS {
        let truncated: String = line.chars().take(MAX_REASON_CHARS).collect();
        format!("{}...", truncated)
    } else {
        line.to_string()
    }
}
