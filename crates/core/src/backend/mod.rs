//! Retrieval backends.
//!
//! A backend is an external extraction strategy: it inspects a video URL,
//! lets the [`FormatSelector`](crate::stream::FormatSelector) pick streams and
//! downloads the result into a staging directory. Backends are tried in the
//! configured order by the [`Orchestrator`](crate::orchestrator::Orchestrator).
//!
//! Failures are classified into [`BackendError`] variants at the subprocess
//! boundary.

mod classify;
mod error;
mod process;
mod traits;
mod youget;
mod ytdlp;

pub use classify::{classify_failure, classify_spawn_error};
pub use error::{BackendError, BackendErrorKind};
pub use traits::{AttemptContext, BackendOutput, RetrievalBackend};
pub use youget::YouGetBackend;
pub use ytdlp::YtDlpBackend;

use std::sync::Arc;

use crate::config::{BackendKind, Config};

/// Factory function to build the ordered backend chain from config.
pub fn create_backends(config: &Config) -> Vec<Arc<dyn RetrievalBackend>> {
    config
        .retrieval
        .backends
        .iter()
        .map(|kind| -> Arc<dyn RetrievalBackend> {
            match kind {
                BackendKind::YtDlp => Arc::new(YtDlpBackend::new(config.yt_dlp.clone())),
                BackendKind::YouGet => Arc::new(YouGetBackend::new(config.you_get.clone())),
            }
        })
        .collect()
}
