use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use super::CookieError;

/// Decoded cookie bundle. Contents are never printed.
#[derive(Clone)]
pub struct CookieMaterial {
    bytes: Vec<u8>,
}

impl CookieMaterial {
    /// Decode standard base64, ignoring embedded whitespace and line breaks.
    pub fn decode(encoded: &str) -> Result<Self, CookieError> {
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(CookieError::Empty);
        }

        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| CookieError::InvalidEncoding(e.to_string()))?;
        if bytes.is_empty() {
            return Err(CookieError::Empty);
        }

        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the material to a fresh file in `dir`.
    ///
    /// The file lives exactly as long as the returned guard.
    pub fn materialize(&self, dir: &Path) -> Result<CookieFile, CookieError> {
        let mut file = tempfile::Builder::new()
            .prefix("cookies-")
            .suffix(".txt")
            .tempfile_in(dir)
            .map_err(|source| CookieError::WriteFailed {
                path: dir.to_path_buf(),
                source,
            })?;

        if let Err(source) = file.write_all(&self.bytes).and_then(|_| file.flush()) {
            return Err(CookieError::WriteFailed {
                path: file.path().to_path_buf(),
                source,
            });
        }

        Ok(CookieFile { file })
    }
}

impl fmt::Debug for CookieMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieMaterial")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Transient credential file, deleted on drop.
pub struct CookieFile {
    file: NamedTempFile,
}

impl CookieFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl fmt::Debug for CookieFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieFile")
            .field("path", &self.file.path())
            .finish()
    }
}
