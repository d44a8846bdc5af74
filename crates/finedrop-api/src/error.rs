//! Upload outcome and its HTTP rendering.
//!
//! The response contract is deliberately unconventional: always HTTP 200 with
//! a single-key JSON body, `{"success":true}` or `{"error":"<message>"}`.
//! Clients inspect the body, never the status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use finedrop_core::UploadError;
use serde_json::json;

/// Terminal result of one upload request.
#[derive(Debug)]
pub enum UploadOutcome {
    Success {
        /// Final stored file name, after any collision rename.
        stored_name: String,
    },
    Failure {
        message: String,
    },
}

impl UploadOutcome {
    pub fn failure(err: &UploadError) -> Self {
        UploadOutcome::Failure {
            message: err.client_message(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }
}

impl IntoResponse for UploadOutcome {
    fn into_response(self) -> Response {
        let body = match &self {
            UploadOutcome::Success { .. } => json!({ "success": true }),
            UploadOutcome::Failure { message } => json!({ "error": message }),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}
