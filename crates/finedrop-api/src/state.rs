//! Shared application state.

use finedrop_core::{Config, UploadPolicy};
use finedrop_storage::LocalStore;

use crate::progress::ProgressTracker;

pub struct AppState {
    pub config: Config,
    pub policy: UploadPolicy,
    pub store: LocalStore,
    pub progress: ProgressTracker,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let policy = config.policy();
        let store = LocalStore::new(policy.upload_dir());
        Self {
            config,
            policy,
            store,
            progress: ProgressTracker::new(),
        }
    }
}
