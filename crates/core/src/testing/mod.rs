//! Testing utilities and mock implementations.
//!
//! This module provides a mock retrieval backend and stream fixtures, so the
//! orchestrator and the HTTP layer can be exercised without yt-dlp, you-get or
//! network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use vidgrab_core::testing::MockBackend;
//! use vidgrab_core::StaticCookieSource;
//!
//! let primary = MockBackend::new("primary").with_cookie_support();
//! let fallback = MockBackend::new("fallback");
//! let cookies = StaticCookieSource::new(Some(base64_cookies));
//!
//! // Build an Orchestrator with Arc-wrapped mocks...
//! ```

mod mock_backend;

pub use mock_backend::{MockBackend, RecordedInvocation};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::stream::{ContainerFormat, StreamDescriptor};

    /// A progressive (audio+video) stream.
    pub fn progressive(id: &str, container: ContainerFormat, height: u32) -> StreamDescriptor {
        StreamDescriptor {
            id: id.to_string(),
            container,
            height: Some(height),
            has_audio: true,
            has_video: true,
            audio_bitrate_kbps: Some(96.0),
            url: Some(format!("https://media.invalid/{}", id)),
            filesize: None,
        }
    }

    /// A video-only stream.
    pub fn video_only(id: &str, container: ContainerFormat, height: u32) -> StreamDescriptor {
        StreamDescriptor {
            id: id.to_string(),
            container,
            height: Some(height),
            has_audio: false,
            has_video: true,
            audio_bitrate_kbps: None,
            url: Some(format!("https://media.invalid/{}", id)),
            filesize: None,
        }
    }

    /// An audio-only stream.
    pub fn audio_only(id: &str, container: ContainerFormat, kbps: f32) -> StreamDescriptor {
        StreamDescriptor {
            id: id.to_string(),
            container,
            height: None,
            has_audio: true,
            has_video: false,
            audio_bitrate_kbps: Some(kbps),
            url: Some(format!("https://media.invalid/{}", id)),
            filesize: None,
        }
    }

    /// Cookie file contents in the Netscape format yt-dlp expects.
    pub fn netscape_cookies() -> &'static str {
        "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tPREF\tf6=40000000\n"
    }
}
