//! you-get backend: progressive streams only, no authentication.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::error::BackendError;
use super::process::{push_url, run_tool};
use super::traits::{AttemptContext, BackendOutput, RetrievalBackend};
use crate::config::YouGetConfig;
use crate::muxer::MuxCapability;
use crate::storage::safe_filename;
use crate::stream::{ContainerFormat, FormatSelector, Selection, StreamDescriptor, VideoMetadata};

/// Fallback backend driving `you-get --json` and fetching the stream itself.
pub struct YouGetBackend {
    config: YouGetConfig,
    client: reqwest::Client,
}

impl YouGetBackend {
    pub fn new(config: YouGetConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client with custom user agent: {}", e);
                reqwest::Client::new()
            });
        Self { config, client }
    }

    /// Stream `url` into `dest`, removing the partial file on failure.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, BackendError> {
        let result = self.fetch_inner(url, dest).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(dest).await {
                debug!("No partial file to remove at {:?}: {}", dest, e);
            }
        }
        result
    }

    async fn fetch_inner(&self, url: &str, dest: &Path) -> Result<u64, BackendError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::extraction_failed(format!("you-get stream request: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BackendError::authentication(format!(
                "you-get stream request returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(BackendError::extraction_failed(format!(
                "you-get stream request returned {}",
                status
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| BackendError::extraction_failed(format!("you-get stream read: {}", e)))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

fn info_args(ctx: &AttemptContext) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--json".into()];
    push_url(&mut args, &ctx.url);
    args
}

#[async_trait]
impl RetrievalBackend for YouGetBackend {
    fn name(&self) -> &str {
        "you_get"
    }

    async fn attempt(&self, ctx: &AttemptContext) -> Result<BackendOutput, BackendError> {
        let stdout = run_tool(&self.config.path, &info_args(ctx)).await?;
        let metadata = parse_metadata(&stdout)?;
        info!(
            "you-get found \"{}\" ({} progressive streams)",
            metadata.title,
            metadata.streams.len()
        );

        // No multiplexing here; the selector only sees progressive streams anyway.
        let selector = FormatSelector::new(ctx.policy.clone(), MuxCapability::unavailable());
        let outcome = selector.select(&metadata.streams)?;
        let stream = match &outcome.selection {
            Selection::Progressive(stream) => stream,
            Selection::Merged { .. } => {
                return Err(BackendError::extraction_failed(
                    "you-get: merged selection is not supported",
                ))
            }
        };

        let url = stream.url.as_deref().ok_or_else(|| {
            BackendError::extraction_failed(format!("you-get: stream {} has no source URL", stream.id))
        })?;

        let dest = ctx.staging_dir.join(format!(
            "{}.{}",
            safe_filename(&metadata.title),
            stream.container.extension()
        ));
        let written = self.fetch(url, &dest).await?;
        debug!("you-get stream {} wrote {} bytes", stream.id, written);

        Ok(BackendOutput {
            title: metadata.title,
            uploader: metadata.uploader,
            file: dest,
            container: stream.container.clone(),
            selection: outcome.selection.label(),
            quality_downgrade: outcome.quality_downgrade,
        })
    }
}

/// Height of a you-get quality label (`hd720`, `medium`, `1080p`, ...).
fn quality_height(quality: &str) -> Option<u32> {
    let quality = quality.trim().to_ascii_lowercase();
    let named = match quality.as_str() {
        "hd2160" => Some(2160),
        "hd1440" => Some(1440),
        "hd1080" => Some(1080),
        "hd720" => Some(720),
        "large" => Some(480),
        "medium" => Some(360),
        "small" => Some(240),
        "tiny" => Some(144),
        _ => None,
    };
    named.or_else(|| {
        let digits: String = quality.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    })
}

#[derive(Debug, Deserialize)]
struct JsonDump {
    title: Option<String>,
    #[serde(default)]
    streams: BTreeMap<String, StreamEntry>,
}

#[derive(Debug, Deserialize)]
struct StreamEntry {
    container: Option<String>,
    quality: Option<String>,
    size: Option<u64>,
    #[serde(default)]
    src: Vec<Value>,
}

/// Parse `you-get --json` output, keeping progressive streams only.
pub(crate) fn parse_metadata(stdout: &[u8]) -> Result<VideoMetadata, BackendError> {
    let dump: JsonDump = serde_json::from_slice(stdout)
        .map_err(|e| BackendError::extraction_failed(format!("you-get: invalid JSON: {}", e)))?;

    let streams = dump
        .streams
        .into_iter()
        // DASH entries are separate video/audio tracks.
        .filter(|(id, _)| !id.starts_with("dash-"))
        .filter_map(|(id, entry)| {
            let container = ContainerFormat::from_extension(entry.container.as_deref()?);
            if container == ContainerFormat::M4a {
                return None;
            }
            let url = entry.src.first().and_then(Value::as_str).map(str::to_string);
            Some(StreamDescriptor {
                id,
                container,
                height: entry.quality.as_deref().and_then(quality_height),
                has_audio: true,
                has_video: true,
                audio_bitrate_kbps: None,
                url,
                filesize: entry.size,
            })
        })
        .collect();

    Ok(VideoMetadata {
        title: dump.title.unwrap_or_else(|| "video".to_string()),
        uploader: None,
        streams,
    })
}
