//! Collision-free destination naming.
//!
//! Given `photo.jpg` already on disk, the next upload of the same name lands
//! at `photo_1.jpg`, then `photo_2.jpg`, and so on; names without an extension
//! get a bare `_N` suffix. [`resolve_collision`] is the pure probing form;
//! [`create_unique`] is the one actual saves go through, where the exclusive
//! `create_new` open is the collision check, so two concurrent requests racing
//! for the same name get distinct files from the filesystem itself.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

/// Candidate path for a given collision counter. Counter 0 is the original
/// path itself.
fn candidate(path: &Path, counter: u32) -> PathBuf {
    if counter == 0 {
        return path.to_path_buf();
    }

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");

    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}_{}.{}", stem, counter, ext),
        _ => format!("{}_{}", stem, counter),
    };

    dir.join(name)
}

/// Resolve a destination path against the current filesystem state.
///
/// Returns `path` unchanged when nothing exists there, otherwise the first
/// `stem_N.ext` candidate that is free. Pure with respect to the filesystem:
/// calling it twice without creating the result yields the same answer.
///
/// This is only a snapshot; anything that actually creates the file must use
/// [`create_unique`] to stay safe under concurrency.
pub fn resolve_collision(path: &Path) -> PathBuf {
    let mut counter = 0u32;
    loop {
        let cand = candidate(path, counter);
        if !cand.is_file() {
            return cand;
        }
        counter += 1;
    }
}

/// Exclusively create the destination file, renaming on collision.
///
/// With `overwrite` set the path is taken as-is and truncated. Otherwise the
/// file is opened with `create_new`; an `AlreadyExists` answer from the
/// filesystem bumps the counter and retries, which closes the
/// time-of-check/time-of-use window a separate existence probe would leave
/// open.
pub async fn create_unique(path: &Path, overwrite: bool) -> io::Result<(fs::File, PathBuf)> {
    if overwrite {
        let file = fs::File::create(path).await?;
        return Ok((file, path.to_path_buf()));
    }

    let mut counter = 0u32;
    loop {
        let cand = candidate(path, counter);
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&cand)
            .await
        {
            Ok(file) => return Ok((file, cand)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(e),
        }
    }
}
