use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::stream::ContainerFormat;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub cookies: CookieConfig,
    #[serde(default)]
    pub yt_dlp: YtDlpConfig,
    #[serde(default)]
    pub you_get: YouGetConfig,
    #[serde(default)]
    pub muxer: MuxerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Where finished downloads live.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub download_dir: PathBuf,
}

/// Retrieval backends known to the orchestrator.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Full-featured extractor with cookie support and stream negotiation.
    YtDlp,
    /// Progressive-only extractor, no authentication.
    YouGet,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::YtDlp => "yt_dlp",
            Self::YouGet => "you_get",
        }
    }
}

/// Retrieval chain configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Backends in priority order. The first success wins.
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendKind>,
    /// Upper bound for a single backend invocation, in seconds.
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_secs: u64,
    /// Container the downloaded file must be delivered in.
    #[serde(default = "default_container")]
    pub container: ContainerFormat,
    /// Cap for the video-only tier considered for merging (None = highest).
    #[serde(default)]
    pub enhanced_max_height: Option<u32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backends: default_backends(),
            timeout_secs: default_retrieval_timeout(),
            container: default_container(),
            enhanced_max_height: None,
        }
    }
}

fn default_backends() -> Vec<BackendKind> {
    vec![BackendKind::YtDlp, BackendKind::YouGet]
}

fn default_retrieval_timeout() -> u64 {
    300
}

fn default_container() -> ContainerFormat {
    ContainerFormat::Mp4
}

/// Cookie material injection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CookieConfig {
    /// Environment variable holding the base64-encoded cookie bundle.
    #[serde(default = "default_cookie_env_var")]
    pub env_var: String,
    /// Directory for transient credential files. Defaults to the system temp dir.
    #[serde(default)]
    pub credential_dir: Option<PathBuf>,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            env_var: default_cookie_env_var(),
            credential_dir: None,
        }
    }
}

impl CookieConfig {
    /// Where credential files are written once the default is applied.
    pub fn effective_credential_dir(&self) -> PathBuf {
        self.credential_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

fn default_cookie_env_var() -> String {
    "YT_COOKIES_B64".to_string()
}

/// yt-dlp backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YtDlpConfig {
    #[serde(default = "default_ytdlp_path")]
    pub path: PathBuf,
    /// Extra arguments appended to every invocation.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            path: default_ytdlp_path(),
            extra_args: Vec::new(),
        }
    }
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

/// you-get backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YouGetConfig {
    #[serde(default = "default_youget_path")]
    pub path: PathBuf,
    /// User agent used when fetching the stream itself.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for YouGetConfig {
    fn default() -> Self {
        Self {
            path: default_youget_path(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_youget_path() -> PathBuf {
    PathBuf::from("you-get")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string()
}

/// Muxing (ffmpeg) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MuxerConfig {
    /// Look for ffmpeg at startup. Disabled by default.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
}

impl Default for MuxerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ffmpeg_path: default_ffmpeg_path(),
        }
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub retrieval: SanitizedRetrievalConfig,
    pub cookies: SanitizedCookieConfig,
    pub muxer_enabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedRetrievalConfig {
    pub backends: Vec<String>,
    pub timeout_secs: u64,
    pub container: String,
}

/// Cookie config without the material itself
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCookieConfig {
    pub env_var: String,
    pub material_configured: bool,
}

impl SanitizedConfig {
    /// Builds the sanitized view. `material_configured` is supplied by the caller
    /// because the material lives in the environment, not in the config.
    pub fn new(config: &Config, material_configured: bool) -> Self {
        Self {
            server: config.server.clone(),
            storage: config.storage.clone(),
            retrieval: SanitizedRetrievalConfig {
                backends: config
                    .retrieval
                    .backends
                    .iter()
                    .map(|b| b.as_str().to_string())
                    .collect(),
                timeout_secs: config.retrieval.timeout_secs,
                container: config.retrieval.container.extension().to_string(),
            },
            cookies: SanitizedCookieConfig {
                env_var: config.cookies.env_var.clone(),
                material_configured,
            },
            muxer_enabled: config.muxer.enabled,
        }
    }
}
