//! Cookie material injection for backends that accept authentication.
//!
//! Material arrives base64-encoded from a [`CookieSource`], is decoded into a
//! [`CookieMaterial`] and written to a [`CookieFile`] that exists only for the
//! duration of a single backend invocation.

mod file;
mod source;

pub use file::{CookieFile, CookieMaterial};
pub use source::{CookieSource, EnvCookieSource, StaticCookieSource};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CookieError {
    #[error("Cookie material is empty")]
    Empty,

    #[error("Cookie material is not valid base64: {0}")]
    InvalidEncoding(String),

    #[error("Failed to write credential file at {path}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
