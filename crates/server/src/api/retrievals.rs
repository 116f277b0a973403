//! JSON retrieval endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use vidgrab_core::{BackendErrorKind, RetrievalError, RetrievalRequest, RetrievalResult};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRetrievalRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct RetrievalResponse {
    #[serde(flatten)]
    pub result: RetrievalResult,
    pub download_url: String,
}

/// One failed attempt, without the tool's diagnostic text.
#[derive(Debug, Serialize)]
pub struct AttemptSummary {
    pub backend: String,
    pub kind: BackendErrorKind,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<AttemptSummary>,
}

/// HTTP status for a failed retrieval, shared by the form and the JSON API.
pub fn error_status(err: &RetrievalError) -> StatusCode {
    match err {
        RetrievalError::Validation(_) => StatusCode::BAD_REQUEST,
        RetrievalError::AllBackendsFailed { .. } => StatusCode::BAD_GATEWAY,
        RetrievalError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Link under which a stored file is served.
pub fn download_url(filename: &str) -> String {
    format!("/download/{}", urlencoding::encode(filename))
}

/// POST /api/v1/retrievals
pub async fn create_retrieval(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRetrievalRequest>,
) -> Response {
    let request = RetrievalRequest::new(body.url);

    match state.orchestrator().retrieve(&request).await {
        Ok(result) => {
            info!(
                backend = %result.backend,
                filename = %result.stored_filename,
                "Retrieval completed"
            );
            let download_url = download_url(&result.stored_filename);
            Json(RetrievalResponse {
                result,
                download_url,
            })
            .into_response()
        }
        Err(err) => {
            let attempts = match &err {
                RetrievalError::AllBackendsFailed { failures } => failures
                    .iter()
                    .map(|f| AttemptSummary {
                        backend: f.backend.clone(),
                        kind: f.kind,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            (
                error_status(&err),
                Json(ErrorResponse {
                    error: err.user_message(),
                    attempts,
                }),
            )
                .into_response()
        }
    }
}
