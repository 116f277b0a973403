//! Stored file listing and downloads.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, error};

use vidgrab_core::StoredFile;

use super::pages::not_found_page;
use super::retrievals::ErrorResponse;
use crate::state::AppState;

/// GET /api/v1/files
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoredFile>>, (StatusCode, Json<ErrorResponse>)> {
    state.storage().list().await.map(Json).map_err(|e| {
        error!("Failed to list downloads: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Failed to list downloads".to_string(),
                attempts: Vec::new(),
            }),
        )
    })
}

/// `Content-Disposition` value with an ASCII fallback and an RFC 5987 UTF-8 name.
pub fn attachment_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// GET /download/{filename}
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
    request: Request<Body>,
) -> Response {
    let path = match state.storage().resolve(&filename).await {
        Ok(path) => path,
        Err(e) if e.is_not_found() => {
            debug!(filename = %filename, "Requested download not found");
            return not_found_page(&filename);
        }
        Err(e) => {
            error!(filename = %filename, "Failed to resolve download: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    };

    // Removed between resolve and open.
    if response.status() == StatusCode::NOT_FOUND {
        return not_found_page(&filename);
    }

    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, attachment_disposition(&filename));
    response
}
