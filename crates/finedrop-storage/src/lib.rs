//! Local filesystem persistence for uploaded files.
//!
//! Two concerns live here: collision-free destination naming (`resolve`) and
//! the actual byte shuffling into the upload directory (`local`). Name
//! resolution is atomic against the filesystem itself, not a check-then-create
//! probe, so concurrent uploads of the same original name cannot clobber each
//! other.

pub mod local;
pub mod resolve;

pub use local::{LocalStore, StorageError};
pub use resolve::resolve_collision;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
