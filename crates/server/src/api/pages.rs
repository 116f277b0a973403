//! HTML form and result pages.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use vidgrab_core::{RetrievalRequest, RetrievalResult, StoredFile};

use super::retrievals::{download_url, error_status};
use crate::state::AppState;

/// Recent downloads shown under the form.
const RECENT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub video_url: String,
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap page content in the shared layout.
pub fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · vidgrab</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 40rem; margin: 2rem auto; padding: 0 1rem; }}
input[type=url] {{ width: 100%; padding: .5rem; box-sizing: border-box; }}
.message {{ padding: .75rem; border-radius: 4px; margin: 1rem 0; }}
.error {{ background: #fde8e8; color: #8a1c1c; }}
.success {{ background: #e6f4ea; color: #1e5631; }}
</style>
</head>
<body>
<h1><a href="/">vidgrab</a></h1>
{content}
</body>
</html>
"#,
        title = escape_html(title),
        content = content,
    )
}

fn form(prefill: &str) -> String {
    format!(
        r#"<form method="post" action="/">
<label for="video_url">Video URL</label>
<input type="url" id="video_url" name="video_url" value="{}" placeholder="https://www.youtube.com/watch?v=..." autofocus>
<button type="submit">Download</button>
</form>"#,
        escape_html(prefill)
    )
}

fn recent_list(files: &[StoredFile]) -> String {
    if files.is_empty() {
        return String::new();
    }
    let items: String = files
        .iter()
        .take(RECENT_LIMIT)
        .map(|f| {
            format!(
                r#"<li><a href="{}">{}</a></li>"#,
                escape_html(&download_url(&f.filename)),
                escape_html(&f.filename)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("<h2>Recent downloads</h2>\n<ul>\n{}\n</ul>", items)
}

/// Page shown when the requested download does not exist.
pub fn not_found_page(filename: &str) -> Response {
    let content = format!(
        r#"<div class="message error">The file "{}" is not available. It may have been removed.</div>
<p><a href="/">Back to the form</a></p>"#,
        escape_html(filename)
    );
    (StatusCode::NOT_FOUND, Html(layout("Not found", &content))).into_response()
}

fn success_page(result: &RetrievalResult) -> String {
    let mut content = format!(
        r#"<div class="message success">Downloaded "{}" using {}.</div>
<p><a href="{}" download>{}</a> ({} bytes, {})</p>"#,
        escape_html(&result.title),
        escape_html(&result.backend),
        escape_html(&download_url(&result.stored_filename)),
        escape_html(&result.stored_filename),
        result.size_bytes,
        escape_html(&result.selection),
    );
    if result.quality_downgrade {
        content.push_str(
            "\n<p>A higher quality version needs merging, which is not available on this server; a lower quality stream was used.</p>",
        );
    }
    content.push('\n');
    content.push_str(&form(""));
    layout("Downloaded", &content)
}

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let files = match state.storage().list().await {
        Ok(files) => files,
        Err(e) => {
            warn!("Failed to list downloads: {}", e);
            Vec::new()
        }
    };
    let content = format!("{}\n{}", form(""), recent_list(&files));
    Html(layout("Download a video", &content))
}

/// POST /
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Form(submission): Form<SubmitForm>,
) -> Response {
    let request = RetrievalRequest::new(submission.video_url);

    match state.orchestrator().retrieve(&request).await {
        Ok(result) => {
            info!(
                backend = %result.backend,
                filename = %result.stored_filename,
                "Retrieval completed"
            );
            (StatusCode::OK, Html(success_page(&result))).into_response()
        }
        Err(err) => {
            let content = format!(
                "<div class=\"message error\">{}</div>\n{}",
                escape_html(&err.user_message()),
                form(request.url.trim())
            );
            (error_status(&err), Html(layout("Download failed", &content))).into_response()
        }
    }
}
