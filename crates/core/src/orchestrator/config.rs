//! Orchestrator configuration.

use std::path::PathBuf;

use crate::config::Config;
use crate::muxer::MuxCapability;
use crate::stream::SelectionPolicy;

/// Runtime settings for the backend orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound for a single backend invocation, in seconds.
    pub timeout_secs: u64,
    pub policy: SelectionPolicy,
    /// Detected once at startup.
    pub mux: MuxCapability,
    /// Where transient cookie files are written. Never the download directory.
    pub credential_dir: PathBuf,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config, mux: MuxCapability) -> Self {
        Self {
            timeout_secs: config.retrieval.timeout_secs,
            policy: SelectionPolicy {
                container: config.retrieval.container.clone(),
                enhanced_max_height: config.retrieval.enhanced_max_height,
            },
            mux,
            credential_dir: config.cookies.effective_credential_dir(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            policy: SelectionPolicy::default(),
            mux: MuxCapability::unavailable(),
            credential_dir: std::env::temp_dir(),
        }
    }
}
