//! Types for the storage module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A finished download in the download directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredFile {
    /// Bare filename, the handle used by the retrieval endpoint.
    pub filename: String,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Request-scoped working directory for one backend attempt.
///
/// Removed with everything left in it when dropped.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub(crate) fn new(dir: TempDir) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }
}
