//! Stream model and format selection.
//!
//! Backends describe what a video offers as a list of [`StreamDescriptor`]s;
//! [`FormatSelector`] turns that list into a single download decision:
//!
//! 1. the highest-resolution progressive stream in the target container, unless
//! 2. a higher video-only tier plus the best compatible audio-only stream exists
//!    and a multiplexer is available, in which case the pair is merged.
//!
//! Without a multiplexer the pair is logged as a quality downgrade and the
//! progressive stream is used. No progressive stream means no result.

mod selector;
mod types;

pub use selector::{FormatSelector, SelectionError, SelectionPolicy};
pub use types::{
    ContainerFormat, Selection, SelectionOutcome, StreamDescriptor, VideoMetadata,
};
