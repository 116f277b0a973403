//! Filename derivation for stored downloads.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Longest stem kept from a title, in bytes. Leaves room within the common
/// 255-byte name limit for a ` (n)` suffix and the extension.
const MAX_STEM_BYTES: usize = 200;

/// Characters that never make it into a stored filename.
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r##"[\x00-\x1f\x7f"#$%'*,.:;<>?\\^|~/]"##).unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Turn a video title into a filesystem-safe stem.
pub fn safe_filename(title: &str) -> String {
    let stripped = UNSAFE_CHARS.replace_all(title, "");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let trimmed = truncate_bytes(collapsed.trim(), MAX_STEM_BYTES).trim_end().to_string();

    if trimmed.is_empty() {
        "video".to_string()
    } else {
        trimmed
    }
}

/// Longest prefix of `text` within `max` bytes that ends on a char boundary.
fn truncate_bytes(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// `stem.ext` for attempt 0, `stem (n).ext` afterwards.
pub fn candidate_name(stem: &str, extension: &str, attempt: usize) -> String {
    match attempt {
        0 => format!("{}.{}", stem, extension),
        n => format!("{} ({}).{}", stem, n, extension),
    }
}

/// Whether `filename` names a plain entry directly inside the download directory.
pub fn is_servable_name(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.starts_with('.')
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains('\0')
}
