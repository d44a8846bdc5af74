//! Upload policy and validation
//!
//! The policy is what the caller configures once (allow-list, size limit,
//! destination directory) and what the handler validates each request against.
//! Validation is decoupled from any storage or transport detail.

use std::path::{Path, PathBuf};

use crate::error::UploadError;

/// Immutable per-request upload policy.
///
/// An empty allow-list means extensions are unrestricted; `size_limit: None`
/// means no limit (and, per the original contract, empty files pass too).
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    upload_dir: PathBuf,
    allowed_extensions: Vec<String>,
    size_limit: Option<u64>,
}

impl UploadPolicy {
    pub fn new(
        upload_dir: impl Into<PathBuf>,
        allowed_extensions: Vec<String>,
        size_limit: Option<u64>,
    ) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.trim().to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
            size_limit,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn size_limit(&self) -> Option<u64> {
        self.size_limit
    }

    /// Validate a declared size against the configured limit.
    ///
    /// Both the empty check and the limit check only apply when a limit is
    /// configured at all.
    pub fn validate_size(&self, declared: u64) -> Result<(), UploadError> {
        let Some(limit) = self.size_limit else {
            return Ok(());
        };

        if declared == 0 {
            return Err(UploadError::EmptyFile);
        }

        if declared > limit {
            return Err(UploadError::FileTooLarge {
                size: declared,
                max: limit,
            });
        }

        Ok(())
    }

    /// Validate the extension of an original filename against the allow-list.
    /// Matching is case-insensitive on both sides; a missing extension counts
    /// as not allowed when a list is configured.
    pub fn validate_extension(&self, filename: &str) -> Result<(), UploadError> {
        if self.allowed_extensions.is_empty() {
            return Ok(());
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !self.allowed_extensions.contains(&extension) {
            return Err(UploadError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }
}
