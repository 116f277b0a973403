//! Trait definitions for retrieval backends.

use async_trait::async_trait;
use std::path::PathBuf;

use super::error::BackendError;
use crate::muxer::MuxCapability;
use crate::stream::{ContainerFormat, SelectionPolicy};

/// Everything a backend needs for one invocation.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    /// Validated, trimmed video URL.
    pub url: String,
    /// Request-scoped directory the backend must download into.
    pub staging_dir: PathBuf,
    /// Transient credential file, present only while this invocation runs.
    pub cookie_file: Option<PathBuf>,
    pub policy: SelectionPolicy,
    pub mux: MuxCapability,
}

/// What a successful invocation produced.
#[derive(Debug, Clone)]
pub struct BackendOutput {
    pub title: String,
    pub uploader: Option<String>,
    /// Finished file inside the staging directory.
    pub file: PathBuf,
    pub container: ContainerFormat,
    /// Human label of the selected stream(s), e.g. `720p mp4`.
    pub selection: String,
    pub quality_downgrade: bool,
}

/// An external retrieval strategy.
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    /// Returns the name of this backend, used in logs and metrics.
    fn name(&self) -> &str;

    /// Whether cookie material should be materialized for this backend.
    fn supports_cookies(&self) -> bool {
        false
    }

    /// Inspect the video, select streams and download into `ctx.staging_dir`.
    async fn attempt(&self, ctx: &AttemptContext) -> Result<BackendOutput, BackendError>;
}
