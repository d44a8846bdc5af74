//! Best-effort upload progress tracking.
//!
//! Stream uploads that carry a progress key report byte counts here while the
//! body is being consumed; a separate set of endpoints polls or cancels by
//! key. None of this is load-bearing: an upload without a key (or a tracker
//! that knows nothing about a key) behaves exactly the same.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    Receiving,
    Done,
    Failed,
    Cancelled,
}

#[derive(Debug)]
struct ProgressEntry {
    bytes_received: u64,
    content_length: Option<u64>,
    state: ProgressState,
    cancel: CancellationToken,
}

/// Point-in-time view of one tracked upload, as served to pollers.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub bytes_received: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    pub state: ProgressState,
}

/// In-process registry of in-flight stream uploads, keyed by a
/// client-supplied progress key.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<RwLock<HashMap<String, ProgressEntry>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an upload under `key` and hand back the handle the stream
    /// feeds. A reused key replaces whatever was tracked before.
    pub fn start(&self, key: &str, content_length: Option<u64>) -> ProgressHandle {
        let cancel = CancellationToken::new();
        let entry = ProgressEntry {
            bytes_received: 0,
            content_length,
            state: ProgressState::Receiving,
            cancel: cancel.clone(),
        };
        self.inner
            .write()
            .expect("progress lock poisoned")
            .insert(key.to_string(), entry);

        ProgressHandle {
            key: key.to_string(),
            tracker: self.clone(),
            cancel,
        }
    }

    /// Current snapshot for `key`. Terminal entries are handed out once and
    /// then dropped, so finished uploads do not accumulate.
    pub fn snapshot(&self, key: &str) -> Option<ProgressSnapshot> {
        let mut map = self.inner.write().expect("progress lock poisoned");
        let entry = map.get(key)?;
        let snapshot = ProgressSnapshot {
            bytes_received: entry.bytes_received,
            content_length: entry.content_length,
            state: entry.state,
        };
        if entry.state != ProgressState::Receiving {
            map.remove(key);
        }
        Some(snapshot)
    }

    /// Flag the upload under `key` for cancellation. Returns whether anything
    /// was actually tracked (and still running) under that key.
    pub fn cancel(&self, key: &str) -> bool {
        let map = self.inner.read().expect("progress lock poisoned");
        match map.get(key) {
            Some(entry) if entry.state == ProgressState::Receiving => {
                entry.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    fn update<F: FnOnce(&mut ProgressEntry)>(&self, key: &str, f: F) {
        let mut map = self.inner.write().expect("progress lock poisoned");
        if let Some(entry) = map.get_mut(key) {
            f(entry);
        }
    }
}

/// Writer side of one tracked upload, held by the stream source.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    key: String,
    tracker: ProgressTracker,
    cancel: CancellationToken,
}

impl ProgressHandle {
    pub fn add_received(&self, bytes: u64) {
        self.tracker
            .update(&self.key, |entry| entry.bytes_received += bytes);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn finish(&self, state: ProgressState) {
        self.tracker.update(&self.key, |entry| entry.state = state);
    }
}
