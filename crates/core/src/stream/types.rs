//! Abstract description of the media variants a backend offers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Container format of a stream or of the delivered file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContainerFormat {
    Mp4,
    Webm,
    M4a,
    ThreeGp,
    Other(String),
}

impl ContainerFormat {
    /// Parses a file extension or container name, case-insensitively.
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "mp4" => Self::Mp4,
            "webm" => Self::Webm,
            "m4a" => Self::M4a,
            "3gp" => Self::ThreeGp,
            other => Self::Other(other.to_string()),
        }
    }

    /// File extension used for the stored file.
    pub fn extension(&self) -> &str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::M4a => "m4a",
            Self::ThreeGp => "3gp",
            Self::Other(ext) => ext,
        }
    }

    /// Whether an audio-only stream in `audio` can be muxed into this container.
    pub fn accepts_audio_from(&self, audio: &ContainerFormat) -> bool {
        match self {
            Self::Mp4 => matches!(audio, Self::M4a | Self::Mp4),
            Self::Webm => matches!(audio, Self::Webm),
            other => other == audio,
        }
    }
}

impl From<String> for ContainerFormat {
    fn from(value: String) -> Self {
        Self::from_extension(&value)
    }
}

impl From<ContainerFormat> for String {
    fn from(value: ContainerFormat) -> Self {
        value.extension().to_string()
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One available media variant of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Backend-specific identifier (yt-dlp format id, you-get itag).
    pub id: String,
    pub container: ContainerFormat,
    /// Vertical resolution in pixels.
    pub height: Option<u32>,
    pub has_audio: bool,
    pub has_video: bool,
    pub audio_bitrate_kbps: Option<f32>,
    /// Direct media URL when the backend exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
}

impl StreamDescriptor {
    /// Audio and video muxed together; needs no post-processing.
    pub fn is_progressive(&self) -> bool {
        self.has_audio && self.has_video
    }

    pub fn is_video_only(&self) -> bool {
        self.has_video && !self.has_audio
    }

    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }

    /// Short human label, e.g. `720p mp4` or `128kbps m4a`.
    pub fn label(&self) -> String {
        match (self.height, self.audio_bitrate_kbps) {
            (Some(h), _) if self.has_video => format!("{}p {}", h, self.container),
            (_, Some(abr)) if self.is_audio_only() => {
                format!("{}kbps {}", abr.round() as u32, self.container)
            }
            _ => format!("{} {}", self.id, self.container),
        }
    }
}

/// What a backend learned about a video before downloading it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub uploader: Option<String>,
    pub streams: Vec<StreamDescriptor>,
}

/// The stream(s) chosen for download.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// A single muxed stream.
    Progressive(StreamDescriptor),
    /// Separate video and audio streams that must be muxed after download.
    Merged {
        video: StreamDescriptor,
        audio: StreamDescriptor,
    },
}

impl Selection {
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }

    /// Resolution of the delivered video.
    pub fn height(&self) -> Option<u32> {
        match self {
            Self::Progressive(stream) => stream.height,
            Self::Merged { video, .. } => video.height,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Progressive(stream) => stream.label(),
            Self::Merged { video, audio } => format!("{} + {}", video.label(), audio.label()),
        }
    }
}

/// Result of running the selection policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionOutcome {
    pub selection: Selection,
    /// A better merged pair existed but could not be muxed.
    pub quality_downgrade: bool,
}
