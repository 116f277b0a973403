use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Storage section exists (enforced by serde)
/// - Server port is not 0
/// - At least one backend, none listed twice
/// - Retrieval timeout is not 0
/// - Credential files are not written into the download directory
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.storage.download_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "storage.download_dir cannot be empty".to_string(),
        ));
    }

    // Retrieval chain validation
    if config.retrieval.backends.is_empty() {
        return Err(ConfigError::ValidationError(
            "retrieval.backends must list at least one backend".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for backend in &config.retrieval.backends {
        if !seen.insert(backend) {
            return Err(ConfigError::ValidationError(format!(
                "retrieval.backends lists '{}' more than once",
                backend.as_str()
            )));
        }
    }

    if config.retrieval.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "retrieval.timeout_secs cannot be 0".to_string(),
        ));
    }

    // Cookie files must never land where downloads are served from
    let credential_dir = resolve_path(&config.cookies.effective_credential_dir());
    let download_dir = resolve_path(&config.storage.download_dir);
    if credential_dir.starts_with(&download_dir) {
        return Err(ConfigError::ValidationError(format!(
            "credential directory {:?} is inside storage.download_dir {:?}; set cookies.credential_dir elsewhere",
            credential_dir, download_dir
        )));
    }

    Ok(())
}

/// Absolute form of `path` with `.` and `..` removed and symlinks resolved
/// on the longest prefix that exists.
fn resolve_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other.as_os_str()),
        }
    }

    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc: PathBuf, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return lexical,
        }
    }
}
