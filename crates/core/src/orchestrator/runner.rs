//! Backend orchestrator implementation.
//!
//! Tries each backend in order, one at a time, and stops at the first
//! success. Every attempt gets its own staging directory and, for backends
//! that accept them, a cookie file that lives only as long as the invocation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::backend::{AttemptContext, BackendError, RetrievalBackend};
use crate::cookies::{CookieFile, CookieMaterial, CookieSource};
use crate::metrics::{BACKEND_ATTEMPTS, BACKEND_DURATION, RETRIEVALS};
use crate::storage::{DownloadStorage, StorageError};

use super::config::OrchestratorConfig;
use super::error::RetrievalError;
use super::types::{BackendFailure, RetrievalRequest, RetrievalResult};

/// Why a single attempt did not produce a result.
enum AttemptError {
    /// The backend failed; the next one may still succeed.
    Backend(BackendError),
    /// The download directory is unusable; no backend can succeed.
    Storage(StorageError),
}

impl From<StorageError> for AttemptError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

/// Runs the ordered backend chain for retrieval requests.
pub struct Orchestrator {
    config: OrchestratorConfig,
    backends: Vec<Arc<dyn RetrievalBackend>>,
    storage: Arc<DownloadStorage>,
    cookie_source: Arc<dyn CookieSource>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        backends: Vec<Arc<dyn RetrievalBackend>>,
        storage: Arc<DownloadStorage>,
        cookie_source: Arc<dyn CookieSource>,
    ) -> Self {
        Self {
            config,
            backends,
            storage,
            cookie_source,
        }
    }

    /// Backend names in the order they are tried.
    pub fn backend_names(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.name().to_string()).collect()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Retrieve the video behind `request` and store it.
    pub async fn retrieve(
        &self,
        request: &RetrievalRequest,
    ) -> Result<RetrievalResult, RetrievalError> {
        let result = self.run_chain(request).await;
        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.metric_label(),
        };
        RETRIEVALS.with_label_values(&[label]).inc();
        result
    }

    async fn run_chain(&self, request: &RetrievalRequest) -> Result<RetrievalResult, RetrievalError> {
        let url = request.validated_url()?;
        info!("Retrieving {} ({} backends)", url, self.backends.len());

        let mut failures = Vec::with_capacity(self.backends.len());

        for backend in &self.backends {
            let name = backend.name();
            match self.attempt(backend.as_ref(), url).await {
                Ok(result) => {
                    info!(
                        "Retrieved \"{}\" by {} via {} as {}",
                        result.title,
                        result.uploader.as_deref().unwrap_or("unknown"),
                        name,
                        result.stored_filename
                    );
                    return Ok(result);
                }
                Err(AttemptError::Backend(err)) => {
                    match &err {
                        BackendError::AuthenticationRequiredOrInvalid { reason } => warn!(
                            "Backend {} needs authentication (cookies missing or invalid): {}",
                            name, reason
                        ),
                        other => warn!("Backend {} failed: {}", name, other),
                    }
                    failures.push(BackendFailure {
                        backend: name.to_string(),
                        kind: err.kind(),
                        reason: err.to_string(),
                    });
                }
                Err(AttemptError::Storage(err)) => {
                    warn!("Storage failure while using backend {}: {}", name, err);
                    return Err(RetrievalError::Storage(err));
                }
            }
        }

        warn!("All {} backends failed for {}", failures.len(), url);
        Err(RetrievalError::AllBackendsFailed { failures })
    }

    /// One backend invocation, from staging to placement.
    async fn attempt(
        &self,
        backend: &dyn RetrievalBackend,
        url: &str,
    ) -> Result<RetrievalResult, AttemptError> {
        let name = backend.name();
        let staging = self.storage.staging_area().await?;
        let started = Instant::now();

        let outcome = {
            let cookie_file = if backend.supports_cookies() {
                self.materialize_cookies(name)
            } else {
                None
            };

            let ctx = AttemptContext {
                url: url.to_string(),
                staging_dir: staging.to_path_buf(),
                cookie_file: cookie_file.as_ref().map(|f| f.path().to_path_buf()),
                policy: self.config.policy.clone(),
                mux: self.config.mux.clone(),
            };

            debug!("Invoking backend {}", name);
            let limit = Duration::from_secs(self.config.timeout_secs);
            let result = match timeout(limit, backend.attempt(&ctx)).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::TimedOut {
                    timeout_secs: self.config.timeout_secs,
                }),
            };

            // Credential file is removed before anything else happens.
            drop(cookie_file);
            result
        };

        BACKEND_DURATION
            .with_label_values(&[name])
            .observe(started.elapsed().as_secs_f64());

        let output = match outcome {
            Ok(output) => output,
            Err(err) => {
                BACKEND_ATTEMPTS
                    .with_label_values(&[name, err.kind().as_str()])
                    .inc();
                return Err(AttemptError::Backend(err));
            }
        };
        BACKEND_ATTEMPTS.with_label_values(&[name, "success"]).inc();

        if output.quality_downgrade {
            info!(
                "Backend {} delivered {} instead of a merged higher-quality pair",
                name, output.selection
            );
        }

        let stored = self
            .storage
            .store(&output.file, &output.title, &output.container)
            .await?;

        Ok(RetrievalResult {
            title: output.title,
            uploader: output.uploader,
            stored_filename: stored.filename,
            backend: name.to_string(),
            size_bytes: stored.size_bytes,
            selection: output.selection,
            quality_downgrade: output.quality_downgrade,
        })
    }

    /// Write cookie material to a transient file, if any is configured and usable.
    fn materialize_cookies(&self, backend: &str) -> Option<CookieFile> {
        let Some(encoded) = self.cookie_source.load() else {
            info!(
                "No cookie material in {}; invoking {} without authentication",
                self.cookie_source.describe(),
                backend
            );
            return None;
        };

        match CookieMaterial::decode(&encoded)
            .and_then(|material| material.materialize(&self.config.credential_dir))
        {
            Ok(file) => {
                debug!("Cookie file for {} at {:?}", backend, file.path());
                Some(file)
            }
            Err(e) => {
                warn!(
                    "Ignoring cookie material from {}: {}; invoking {} without authentication",
                    self.cookie_source.describe(),
                    e,
                    backend
                );
                None
            }
        }
    }
}
