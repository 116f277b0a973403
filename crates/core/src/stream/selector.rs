//! Deterministic stream selection policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::types::{ContainerFormat, Selection, SelectionOutcome, StreamDescriptor};
use crate::metrics::QUALITY_DOWNGRADES;
use crate::muxer::MuxCapability;

/// Selection failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// Nothing matching the policy was offered.
    #[error("No compatible {container} stream with audio and video")]
    NoCompatibleStream { container: ContainerFormat },
}

/// What the caller wants delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    pub container: ContainerFormat,
    /// Cap on the video-only tier considered for merging.
    #[serde(default)]
    pub enhanced_max_height: Option<u32>,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            container: ContainerFormat::Mp4,
            enhanced_max_height: None,
        }
    }
}

/// Chooses the stream(s) to download from what a backend offers.
pub struct FormatSelector {
    policy: SelectionPolicy,
    mux: MuxCapability,
}

impl FormatSelector {
    pub fn new(policy: SelectionPolicy, mux: MuxCapability) -> Self {
        Self { policy, mux }
    }

    /// Highest-resolution progressive stream in the target container.
    ///
    /// Stable ordering: among equal resolutions the backend's order decides.
    pub fn best_progressive<'a>(&self, streams: &'a [StreamDescriptor]) -> Option<&'a StreamDescriptor> {
        let mut candidates: Vec<&StreamDescriptor> = streams
            .iter()
            .filter(|s| s.is_progressive() && s.container == self.policy.container)
            .collect();
        candidates.sort_by(|a, b| b.height.unwrap_or(0).cmp(&a.height.unwrap_or(0)));
        candidates.into_iter().next()
    }

    /// Highest-tier video-only stream plus the best compatible audio-only stream.
    pub fn enhanced_pair<'a>(
        &self,
        streams: &'a [StreamDescriptor],
    ) -> Option<(&'a StreamDescriptor, &'a StreamDescriptor)> {
        let cap = self.policy.enhanced_max_height.unwrap_or(u32::MAX);

        let mut videos: Vec<&StreamDescriptor> = streams
            .iter()
            .filter(|s| {
                s.is_video_only()
                    && s.container == self.policy.container
                    && s.height.is_some_and(|h| h <= cap)
            })
            .collect();
        videos.sort_by(|a, b| b.height.cmp(&a.height));
        let video = videos.into_iter().next()?;

        let mut audios: Vec<&StreamDescriptor> = streams
            .iter()
            .filter(|s| s.is_audio_only() && self.policy.container.accepts_audio_from(&s.container))
            .collect();
        audios.sort_by(|a, b| {
            let a = a.audio_bitrate_kbps.unwrap_or(0.0);
            let b = b.audio_bitrate_kbps.unwrap_or(0.0);
            b.total_cmp(&a)
        });
        let audio = audios.into_iter().next()?;

        Some((video, audio))
    }

    /// Runs the full policy.
    pub fn select(&self, streams: &[StreamDescriptor]) -> Result<SelectionOutcome, SelectionError> {
        let progressive = self.best_progressive(streams);
        let progressive_height = progressive.and_then(|s| s.height).unwrap_or(0);

        // A merged pair is only worth it when it beats the progressive option.
        let enhanced = self
            .enhanced_pair(streams)
            .filter(|(video, _)| progressive.is_none() || video.height.unwrap_or(0) > progressive_height);

        let mut quality_downgrade = false;
        if let Some((video, audio)) = enhanced {
            if self.mux.is_available() {
                debug!("Selected merged pair {} + {}", video.label(), audio.label());
                return Ok(SelectionOutcome {
                    selection: Selection::Merged {
                        video: video.clone(),
                        audio: audio.clone(),
                    },
                    quality_downgrade: false,
                });
            }

            quality_downgrade = true;
            QUALITY_DOWNGRADES.inc();
            info!(
                "Quality downgrade: {} + {} available but no multiplexer; using progressive {}",
                video.label(),
                audio.label(),
                progressive
                    .map(|p| p.label())
                    .unwrap_or_else(|| "stream (none found)".to_string())
            );
        }

        match progressive {
            Some(stream) => {
                debug!("Selected progressive stream {}", stream.label());
                Ok(SelectionOutcome {
                    selection: Selection::Progressive(stream.clone()),
                    quality_downgrade,
                })
            }
            None => Err(SelectionError::NoCompatibleStream {
                container: self.policy.container.clone(),
            }),
        }
    }
}
