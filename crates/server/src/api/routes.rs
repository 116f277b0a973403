use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{files, handlers, middleware::metrics_middleware, pages, retrievals};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Retrievals
        .route("/retrievals", post(retrievals::create_retrieval))
        // Stored files
        .route("/files", get(files::list_files));

    Router::new()
        .route("/", get(pages::index).post(pages::submit))
        .route("/download/{filename}", get(files::download))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", api_routes)
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
