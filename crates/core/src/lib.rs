pub mod backend;
pub mod config;
pub mod cookies;
pub mod metrics;
pub mod muxer;
pub mod orchestrator;
pub mod storage;
pub mod stream;
pub mod testing;

pub use backend::{
    create_backends, AttemptContext, BackendError, BackendErrorKind, BackendOutput,
    RetrievalBackend, YouGetBackend, YtDlpBackend,
};
pub use config::{
    load_config, load_config_from_str, validate_config, BackendKind, Config, ConfigError,
    SanitizedConfig,
};
pub use cookies::{CookieError, CookieSource, EnvCookieSource, StaticCookieSource};
pub use muxer::MuxCapability;
pub use orchestrator::{
    BackendFailure, Orchestrator, OrchestratorConfig, RetrievalError, RetrievalRequest,
    RetrievalResult,
};
pub use storage::{DownloadStorage, StorageError, StoredFile};
pub use stream::{
    ContainerFormat, FormatSelector, Selection, SelectionError, SelectionOutcome,
    SelectionPolicy, StreamDescriptor, VideoMetadata,
};
