//! Local filesystem store for the upload directory.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncRead;

use crate::resolve::create_unique;
use crate::StorageResult;

/// Storage operation errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Size mismatch: expected {expected} bytes, received {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("Save failed: {0}")]
    SaveFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single writable upload directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Probe whether the upload directory accepts new files, by actually
    /// creating (and dropping) an anonymous temp file in it. The probe does
    /// filesystem work, so it runs on the blocking pool.
    pub async fn is_writable(&self) -> bool {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || tempfile::tempfile_in(dir).is_ok())
            .await
            .unwrap_or(false)
    }

    /// Client-supplied names must stay inside the upload directory: a bare
    /// file name, no separators, no parent references.
    fn destination(&self, name: &str) -> StorageResult<PathBuf> {
        let trimmed = name.trim();
        if trimmed.is_empty()
            || trimmed == ".."
            || trimmed.contains('/')
            || trimmed.contains('\\')
        {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(trimmed))
    }

    /// Stream `reader` into a collision-free file named after `name`.
    ///
    /// The copy is bounded-memory. The transferred byte count must equal
    /// `declared` exactly; a short or long body means the client lied about
    /// its content length or the transfer was cut off, and the partial file is
    /// removed before the error is returned.
    pub async fn save_stream<R>(
        &self,
        name: &str,
        declared: u64,
        mut reader: R,
        overwrite: bool,
    ) -> StorageResult<PathBuf>
    where
        R: AsyncRead + Unpin,
    {
        let dest = self.destination(name)?;
        let start = std::time::Instant::now();

        let (mut file, path) = create_unique(&dest, overwrite).await.map_err(|e| {
            StorageError::SaveFailed(format!("Failed to create {}: {}", dest.display(), e))
        })?;

        let copied = match tokio::io::copy(&mut reader, &mut file).await {
            Ok(copied) => copied,
            Err(e) => {
                self.discard_partial(&path).await;
                return Err(StorageError::SaveFailed(format!(
                    "Failed to write stream to {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        if copied != declared {
            self.discard_partial(&path).await;
            return Err(StorageError::SizeMismatch {
                expected: declared,
                actual: copied,
            });
        }

        if let Err(e) = file.sync_all().await {
            self.discard_partial(&path).await;
            return Err(StorageError::SaveFailed(format!(
                "Failed to sync {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            path = %path.display(),
            size_bytes = copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stream upload saved"
        );

        Ok(path)
    }

    /// Copy an already-buffered file (the multipart spool) into a
    /// collision-free destination named after `name`.
    pub async fn save_file(
        &self,
        name: &str,
        src: &Path,
        overwrite: bool,
    ) -> StorageResult<PathBuf> {
        let dest = self.destination(name)?;
        let start = std::time::Instant::now();

        let mut src_file = fs::File::open(src).await.map_err(|e| {
            StorageError::SaveFailed(format!("Failed to open spool {}: {}", src.display(), e))
        })?;

        let (mut file, path) = create_unique(&dest, overwrite).await.map_err(|e| {
            StorageError::SaveFailed(format!("Failed to create {}: {}", dest.display(), e))
        })?;

        let copied = match tokio::io::copy(&mut src_file, &mut file).await {
            Ok(copied) => copied,
            Err(e) => {
                self.discard_partial(&path).await;
                return Err(StorageError::SaveFailed(format!(
                    "Failed to copy {} to {}: {}",
                    src.display(),
                    path.display(),
                    e
                )));
            }
        };

        if let Err(e) = file.sync_all().await {
            self.discard_partial(&path).await;
            return Err(StorageError::SaveFailed(format!(
                "Failed to sync {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            path = %path.display(),
            size_bytes = copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Form upload saved"
        );

        Ok(path)
    }

    /// Best-effort removal of a partially written destination.
    async fn discard_partial(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove partial upload"
            );
        }
    }
}
