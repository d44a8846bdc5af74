//! Upload source adapters.
//!
//! The two transport styles are interchangeable behind [`UploadSource`]:
//! a raw streamed request body (`StreamSource`) and a multipart form field
//! (`FormSource`). Exactly one is active per request; the dispatcher picks
//! based on the request content-type.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Multipart;
use futures::StreamExt;
use finedrop_core::UploadError;
use finedrop_storage::{LocalStore, StorageError};
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

use crate::progress::ProgressHandle;

/// The multipart field (and query parameter) the client puts the file in.
pub const UPLOAD_FIELD: &str = "qqfile";

fn storage_error(err: StorageError) -> UploadError {
    match err {
        StorageError::SizeMismatch { expected, actual } => {
            tracing::warn!(expected, actual, "Transferred size did not match declared size");
            UploadError::SaveFailed(err.to_string())
        }
        other => UploadError::SaveFailed(other.to_string()),
    }
}

/// Capability set every upload source provides: a declared byte size, the
/// original file name, and a way to persist the bytes into the store.
#[async_trait]
pub trait UploadSource: Send {
    /// Size the transport declared for this upload, in bytes.
    fn declared_size(&self) -> Result<u64, UploadError>;

    /// File name as the client submitted it.
    fn original_name(&self) -> &str;

    /// Persist the upload under its original name inside `store`, going
    /// through collision resolution unless `overwrite` is set. On success the
    /// final stored name is recorded and the full path returned.
    async fn save(&mut self, store: &LocalStore, overwrite: bool) -> Result<PathBuf, UploadError>;

    /// Final stored file name, available after a successful save.
    fn upload_name(&self) -> Option<&str>;
}

/// Raw-body upload: the file is the entire request body, the name comes from
/// the `qqfile` query parameter, and the size from `Content-Length`.
pub struct StreamSource {
    name: String,
    content_length: Option<u64>,
    body: Option<Body>,
    progress: Option<ProgressHandle>,
    upload_name: Option<String>,
}

impl StreamSource {
    pub fn new(
        name: String,
        content_length: Option<u64>,
        body: Body,
        progress: Option<ProgressHandle>,
    ) -> Self {
        Self {
            name,
            content_length,
            body: Some(body),
            progress,
            upload_name: None,
        }
    }
}

#[async_trait]
impl UploadSource for StreamSource {
    fn declared_size(&self) -> Result<u64, UploadError> {
        // No silent zero: without a content length the size checks are
        // meaningless, so the whole upload is refused.
        self.content_length.ok_or(UploadError::LengthUnavailable)
    }

    fn original_name(&self) -> &str {
        &self.name
    }

    async fn save(&mut self, store: &LocalStore, overwrite: bool) -> Result<PathBuf, UploadError> {
        let declared = self.declared_size()?;
        let body = self
            .body
            .take()
            .ok_or_else(|| UploadError::SaveFailed("request body already consumed".to_string()))?;

        let progress = self.progress.clone();
        let stream = body.into_data_stream().map(move |chunk| match chunk {
            Ok(bytes) => {
                if let Some(progress) = &progress {
                    if progress.is_cancelled() {
                        return Err(io::Error::new(
                            io::ErrorKind::Interrupted,
                            "upload cancelled by client",
                        ));
                    }
                    progress.add_received(bytes.len() as u64);
                }
                Ok(bytes)
            }
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
        });

        let reader = StreamReader::new(stream);
        let path = store
            .save_stream(&self.name, declared, reader, overwrite)
            .await
            .map_err(storage_error)?;

        self.upload_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        Ok(path)
    }

    fn upload_name(&self) -> Option<&str> {
        self.upload_name.as_deref()
    }
}

/// Multipart upload: name and size come from the `qqfile` field's own
/// metadata; the field body is spooled to a temp file while the form is read,
/// then copied into place on save.
pub struct FormSource {
    name: String,
    size: u64,
    spool: NamedTempFile,
    upload_name: Option<String>,
}

impl FormSource {
    /// Drain the multipart form and spool the `qqfile` field.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, UploadError> {
        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::SaveFailed(format!("multipart error: {}", e)))?
        {
            if field.name() != Some(UPLOAD_FIELD) {
                continue;
            }

            let name = field.file_name().unwrap_or_default().to_string();

            let spool = NamedTempFile::new()
                .map_err(|e| UploadError::SaveFailed(format!("failed to create spool: {}", e)))?;
            let mut writer = tokio::fs::File::from_std(
                spool
                    .reopen()
                    .map_err(|e| UploadError::SaveFailed(format!("failed to open spool: {}", e)))?,
            );

            let mut size = 0u64;
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| UploadError::SaveFailed(format!("multipart read error: {}", e)))?
            {
                size += chunk.len() as u64;
                writer.write_all(&chunk).await.map_err(|e| {
                    UploadError::SaveFailed(format!("failed to spool upload: {}", e))
                })?;
            }
            writer
                .flush()
                .await
                .map_err(|e| UploadError::SaveFailed(format!("failed to spool upload: {}", e)))?;

            return Ok(Self {
                name,
                size,
                spool,
                upload_name: None,
            });
        }

        Err(UploadError::SaveFailed(format!(
            "multipart field '{}' missing",
            UPLOAD_FIELD
        )))
    }

    #[cfg(test)]
    pub fn from_spooled(name: String, spool: NamedTempFile, size: u64) -> Self {
        Self {
            name,
            size,
            spool,
            upload_name: None,
        }
    }
}

#[async_trait]
impl UploadSource for FormSource {
    fn declared_size(&self) -> Result<u64, UploadError> {
        Ok(self.size)
    }

    fn original_name(&self) -> &str {
        &self.name
    }

    async fn save(&mut self, store: &LocalStore, overwrite: bool) -> Result<PathBuf, UploadError> {
        let path = store
            .save_file(&self.name, self.spool.path(), overwrite)
            .await
            .map_err(storage_error)?;

        self.upload_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        Ok(path)
    }

    fn upload_name(&self) -> Option<&str> {
        self.upload_name.as_deref()
    }
}
