//! Route table.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_request_body_size as usize;

    Router::new()
        .route("/upload", post(handlers::upload::upload))
        .route("/progress/element", get(handlers::progress::element))
        .route("/progress/{key}", get(handlers::progress::poll))
        .route("/progress/{key}/cancel", post(handlers::progress::cancel))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
