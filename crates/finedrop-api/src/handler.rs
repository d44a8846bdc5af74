//! Upload orchestration.
//!
//! `handle_upload` runs the validation pipeline against the active source and
//! delegates the actual save to it. Check order is part of the contract:
//! first failing check wins, so error messages are deterministic.

use finedrop_core::{UploadError, UploadPolicy};
use finedrop_storage::LocalStore;

use crate::error::UploadOutcome;
use crate::source::UploadSource;

pub async fn handle_upload(
    source: &mut dyn UploadSource,
    policy: &UploadPolicy,
    store: &LocalStore,
    allow_overwrite: bool,
) -> UploadOutcome {
    if !store.is_writable().await {
        let err = UploadError::DirectoryNotWritable(store.dir().display().to_string());
        tracing::error!(dir = %store.dir().display(), "Upload directory is not writable");
        return UploadOutcome::failure(&err);
    }

    let declared = match source.declared_size() {
        Ok(size) => size,
        Err(err) => {
            tracing::warn!(name = %source.original_name(), error = %err, "Upload rejected");
            return UploadOutcome::failure(&err);
        }
    };

    if let Err(err) = policy.validate_size(declared) {
        tracing::warn!(
            name = %source.original_name(),
            declared_size = declared,
            error = %err,
            "Upload rejected by size policy"
        );
        return UploadOutcome::failure(&err);
    }

    if let Err(err) = policy.validate_extension(source.original_name()) {
        tracing::warn!(
            name = %source.original_name(),
            error = %err,
            "Upload rejected by extension policy"
        );
        return UploadOutcome::failure(&err);
    }

    match source.save(store, allow_overwrite).await {
        Ok(path) => {
            let stored_name = source
                .upload_name()
                .unwrap_or_else(|| source.original_name())
                .to_string();
            tracing::info!(
                name = %source.original_name(),
                stored = %path.display(),
                size_bytes = declared,
                "Upload stored"
            );
            UploadOutcome::Success { stored_name }
        }
        Err(err) => {
            tracing::warn!(name = %source.original_name(), error = %err, "Upload save failed");
            UploadOutcome::failure(&err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StreamSource;
    use axum::body::Body;
    use finedrop_core::UploadPolicy;
    use tempfile::tempdir;

    fn policy_for(dir: &std::path::Path) -> UploadPolicy {
        UploadPolicy::new(
            dir,
            vec!["jpg".to_string(), "png".to_string()],
            Some(1024 * 1024),
        )
    }

    #[tokio::test]
    async fn test_unwritable_directory_short_circuits() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");
        let policy = policy_for(&missing);
        let store = LocalStore::new(&missing);

        let mut source =
            StreamSource::new("a.jpg".to_string(), Some(4), Body::from(&b"data"[..]), None);
        let outcome = handle_upload(&mut source, &policy, &store, false).await;

        match outcome {
            UploadOutcome::Failure { message } => {
                assert_eq!(message, "Server error. Upload directory isn't writable.")
            }
            _ => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_too_large_beats_extension_check() {
        let dir = tempdir().unwrap();
        let policy = policy_for(dir.path());
        let store = LocalStore::new(dir.path());

        // Both checks would fail; size comes first in the pipeline.
        let mut source = StreamSource::new(
            "a.gif".to_string(),
            Some(2 * 1024 * 1024),
            Body::empty(),
            None,
        );
        let outcome = handle_upload(&mut source, &policy, &store, false).await;

        match outcome {
            UploadOutcome::Failure { message } => assert_eq!(message, "File is too large"),
            _ => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_missing_length_is_a_normal_failure() {
        let dir = tempdir().unwrap();
        let policy = policy_for(dir.path());
        let store = LocalStore::new(dir.path());

        let mut source = StreamSource::new("a.jpg".to_string(), None, Body::empty(), None);
        let outcome = handle_upload(&mut source, &policy, &store, false).await;
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_successful_upload_reports_stored_name() {
        let dir = tempdir().unwrap();
        let policy = policy_for(dir.path());
        let store = LocalStore::new(dir.path());

        let mut source =
            StreamSource::new("a.jpg".to_string(), Some(4), Body::from(&b"data"[..]), None);
        let outcome = handle_upload(&mut source, &policy, &store, false).await;

        match outcome {
            UploadOutcome::Success { stored_name } => assert_eq!(stored_name, "a.jpg"),
            _ => panic!("expected success"),
        }
        assert_eq!(std::fs::read(dir.path().join("a.jpg")).unwrap(), b"data");
    }
}
