//! Upload request dispatcher.
//!
//! Content-type decides the adapter: anything starting with `multipart/`
//! (case-insensitive) goes through the form field parser, everything else is
//! treated as a raw streamed body with the name in the `qqfile` query
//! parameter. Progress wiring is opt-in and never required for the upload
//! itself.

use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde::Deserialize;

use finedrop_core::UploadError;

use crate::error::UploadOutcome;
use crate::handler::handle_upload;
use crate::progress::{ProgressHandle, ProgressState};
use crate::source::{FormSource, StreamSource};
use crate::state::AppState;

/// Header alternative to the `progress` query parameter.
pub const PROGRESS_HEADER: &str = "x-progress-id";

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Original file name for raw-body uploads.
    #[serde(default)]
    pub qqfile: Option<String>,
    /// Optional progress key for raw-body uploads.
    #[serde(default)]
    pub progress: Option<String>,
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    req: Request,
) -> UploadOutcome {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_lowercase();

    if content_type.starts_with("multipart/") {
        let multipart = match Multipart::from_request(req, &state).await {
            Ok(multipart) => multipart,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed multipart request");
                return UploadOutcome::failure(&UploadError::SaveFailed(e.to_string()));
            }
        };

        let mut source = match FormSource::from_multipart(multipart).await {
            Ok(source) => source,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read multipart upload");
                return UploadOutcome::failure(&err);
            }
        };

        return handle_upload(
            &mut source,
            &state.policy,
            &state.store,
            state.config.allow_overwrite,
        )
        .await;
    }

    // Raw-body upload.
    let content_length = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let progress_key = params.progress.clone().or_else(|| {
        req.headers()
            .get(PROGRESS_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });
    let progress: Option<ProgressHandle> = progress_key
        .as_deref()
        .map(|key| state.progress.start(key, content_length));

    let name = params.qqfile.unwrap_or_default();
    let mut source = StreamSource::new(
        name,
        content_length,
        req.into_body(),
        progress.clone(),
    );

    let outcome = handle_upload(
        &mut source,
        &state.policy,
        &state.store,
        state.config.allow_overwrite,
    )
    .await;

    if let Some(progress) = progress {
        let final_state = if outcome.is_success() {
            ProgressState::Done
        } else if progress.is_cancelled() {
            ProgressState::Cancelled
        } else {
            ProgressState::Failed
        };
        progress.finish(final_state);
    }

    outcome
}
