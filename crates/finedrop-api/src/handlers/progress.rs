//! Progress polling endpoints.
//!
//! Best-effort companions to the upload route; they share only the tracker
//! with it and are never required for an upload to succeed.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::handlers::upload::PROGRESS_HEADER;
use crate::state::AppState;

/// Parameter contract for clients that want progress reporting: which query
/// parameter or header to send with the upload, and how often to poll.
pub async fn element() -> Json<Value> {
    Json(json!({
        "progress_param": "progress",
        "progress_header": PROGRESS_HEADER,
        "min_poll_interval_ms": 500,
    }))
}

/// Snapshot of one tracked upload, or an empty object for unknown keys.
pub async fn poll(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Json<Value> {
    let body = state
        .progress
        .snapshot(&key)
        .and_then(|snapshot| serde_json::to_value(snapshot).ok())
        .unwrap_or_else(|| json!({}));
    Json(body)
}

/// Flag an in-flight upload for cancellation.
pub async fn cancel(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Json<Value> {
    let cancelled = state.progress.cancel(&key);
    if cancelled {
        tracing::info!(key = %key, "Upload cancellation requested");
    }
    Json(json!({ "success": cancelled }))
}
