//! Detection of the external multiplexing capability (ffmpeg).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::MuxerConfig;

/// Whether separately downloaded video and audio can be merged into one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuxCapability {
    /// ffmpeg binary, present only when it answered `-version`.
    pub ffmpeg_path: Option<PathBuf>,
}

impl MuxCapability {
    /// No multiplexer on this host.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// A multiplexer known to be at `ffmpeg_path`.
    pub fn available(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path: Some(ffmpeg_path),
        }
    }

    /// Check for ffmpeg if muxing is enabled in config.
    pub async fn detect(config: &MuxerConfig) -> Self {
        if !config.enabled {
            info!("Muxing disabled; merged video+audio downloads will be skipped");
            return Self::unavailable();
        }

        let output = Command::new(&config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match output {
            Ok(status) if status.success() => {
                info!("ffmpeg available at {:?}", config.ffmpeg_path);
                Self::available(config.ffmpeg_path.clone())
            }
            Ok(status) => {
                warn!(
                    "ffmpeg at {:?} exited with {:?}; muxing unavailable",
                    config.ffmpeg_path,
                    status.code()
                );
                Self::unavailable()
            }
            Err(e) => {
                warn!(
                    "ffmpeg not usable at {:?}: {}; muxing unavailable",
                    config.ffmpeg_path, e
                );
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.ffmpeg_path.is_some()
    }
}
