//! yt-dlp backend: full format negotiation and cookie support.

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::BackendError;
use super::process::{push_url, run_tool};
use super::traits::{AttemptContext, BackendOutput, RetrievalBackend};
use crate::config::YtDlpConfig;
use crate::stream::{
    ContainerFormat, FormatSelector, Selection, StreamDescriptor, VideoMetadata,
};

/// Suffixes of files yt-dlp leaves behind while (or after failing) downloading.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp", ".tmp"];

/// Primary backend driving the `yt-dlp` command line tool.
pub struct YtDlpBackend {
    config: YtDlpConfig,
}

impl YtDlpBackend {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    /// Arguments for the metadata query.
    pub(crate) fn info_args(&self, ctx: &AttemptContext) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--dump-json".into(),
            "--no-playlist".into(),
            "--no-warnings".into(),
        ];
        self.push_common_args(&mut args, ctx);
        push_url(&mut args, &ctx.url);
        args
    }

    /// Arguments for downloading `selection` into the staging directory.
    pub(crate) fn download_args(&self, ctx: &AttemptContext, selection: &Selection) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--no-playlist".into(),
            "--no-progress".into(),
            "--no-warnings".into(),
            "-f".into(),
            format_spec(selection).into(),
            "-P".into(),
            ctx.staging_dir.clone().into_os_string(),
            "-o".into(),
            "%(title)s.%(ext)s".into(),
        ];

        if selection.is_merged() {
            if let Some(ffmpeg) = &ctx.mux.ffmpeg_path {
                args.push("--merge-output-format".into());
                args.push(ctx.policy.container.extension().into());
                args.push("--ffmpeg-location".into());
                args.push(ffmpeg.clone().into_os_string());
            }
        }

        self.push_common_args(&mut args, ctx);
        push_url(&mut args, &ctx.url);
        args
    }

    fn push_common_args(&self, args: &mut Vec<OsString>, ctx: &AttemptContext) {
        if let Some(cookie_file) = &ctx.cookie_file {
            args.push("--cookies".into());
            args.push(cookie_file.clone().into_os_string());
        }
        args.extend(self.config.extra_args.iter().map(OsString::from));
    }
}

#[async_trait]
impl RetrievalBackend for YtDlpBackend {
    fn name(&self) -> &str {
        "yt_dlp"
    }

    fn supports_cookies(&self) -> bool {
        true
    }

    async fn attempt(&self, ctx: &AttemptContext) -> Result<BackendOutput, BackendError> {
        let stdout = run_tool(&self.config.path, &self.info_args(ctx)).await?;
        let metadata = parse_metadata(&stdout)?;
        info!(
            "yt-dlp found \"{}\" by {} ({} formats)",
            metadata.title,
            metadata.uploader.as_deref().unwrap_or("unknown"),
            metadata.streams.len()
        );

        let selector = FormatSelector::new(ctx.policy.clone(), ctx.mux.clone());
        let outcome = selector.select(&metadata.streams)?;
        debug!("yt-dlp selection: {}", outcome.selection.label());

        run_tool(&self.config.path, &self.download_args(ctx, &outcome.selection)).await?;
        let file = find_finished_file(&ctx.staging_dir).await?;

        let container = if outcome.selection.is_merged() {
            ctx.policy.container.clone()
        } else {
            file.extension()
                .and_then(|e| e.to_str())
                .map(ContainerFormat::from_extension)
                .unwrap_or_else(|| ctx.policy.container.clone())
        };

        Ok(BackendOutput {
            title: metadata.title,
            uploader: metadata.uploader,
            file,
            container,
            selection: outcome.selection.label(),
            quality_downgrade: outcome.quality_downgrade,
        })
    }
}

/// `-f` argument for a selection.
fn format_spec(selection: &Selection) -> String {
    match selection {
        Selection::Progressive(stream) => stream.id.clone(),
        Selection::Merged { video, audio } => format!("{}+{}", video.id, audio.id),
    }
}

#[derive(Debug, Deserialize)]
struct DumpJson {
    title: Option<String>,
    uploader: Option<String>,
    #[serde(default)]
    formats: Vec<FormatEntry>,
}

#[derive(Debug, Deserialize)]
struct FormatEntry {
    format_id: String,
    ext: Option<String>,
    height: Option<u32>,
    vcodec: Option<String>,
    acodec: Option<String>,
    abr: Option<f32>,
    url: Option<String>,
    filesize: Option<u64>,
    filesize_approx: Option<u64>,
}

impl FormatEntry {
    fn into_descriptor(self) -> StreamDescriptor {
        let has_video = match self.vcodec.as_deref() {
            Some("none") => false,
            Some(_) => true,
            None => self.height.is_some(),
        };
        let has_audio = match self.acodec.as_deref() {
            Some("none") => false,
            Some(_) => true,
            None => self.abr.is_some(),
        };

        StreamDescriptor {
            id: self.format_id,
            container: ContainerFormat::from_extension(self.ext.as_deref().unwrap_or("")),
            height: self.height,
            has_audio,
            has_video,
            audio_bitrate_kbps: self.abr,
            url: self.url,
            filesize: self.filesize.or(self.filesize_approx),
        }
    }
}

/// Parse `--dump-json` output into the neutral stream model.
pub(crate) fn parse_metadata(stdout: &[u8]) -> Result<VideoMetadata, BackendError> {
    let dump: DumpJson = serde_json::from_slice(stdout)
        .map_err(|e| BackendError::extraction_failed(format!("yt-dlp: invalid JSON: {}", e)))?;

    Ok(VideoMetadata {
        title: dump.title.unwrap_or_else(|| "video".to_string()),
        uploader: dump.uploader,
        streams: dump
            .formats
            .into_iter()
            .map(FormatEntry::into_descriptor)
            .collect(),
    })
}

/// The single finished file yt-dlp wrote into `dir` (largest if several).
async fn find_finished_file(dir: &Path) -> Result<PathBuf, BackendError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut best: Option<(u64, PathBuf)> = None;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            continue;
        }
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        if best.as_ref().map_or(true, |(size, _)| meta.len() > *size) {
            best = Some((meta.len(), entry.path()));
        }
    }

    best.map(|(_, path)| path).ok_or_else(|| {
        BackendError::extraction_failed("yt-dlp: finished without producing a file")
    })
}
