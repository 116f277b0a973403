use std::sync::Arc;

use vidgrab_core::{Config, CookieSource, DownloadStorage, Orchestrator, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    orchestrator: Arc<Orchestrator>,
    storage: Arc<DownloadStorage>,
    cookie_source: Arc<dyn CookieSource>,
}

impl AppState {
    pub fn new(
        config: Config,
        orchestrator: Arc<Orchestrator>,
        storage: Arc<DownloadStorage>,
        cookie_source: Arc<dyn CookieSource>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            storage,
            cookie_source,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Config view for the API. Cookie material is reported as present or absent only.
    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::new(&self.config, self.cookie_source.load().is_some())
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    pub fn storage(&self) -> &Arc<DownloadStorage> {
        &self.storage
    }
}
