//! Core types for the finedrop upload service: upload policy, configuration,
//! size-string parsing, and the error taxonomy shared by all crates.

pub mod byte_size;
pub mod config;
pub mod error;
pub mod policy;

pub use byte_size::parse_size;
pub use config::Config;
pub use error::UploadError;
pub use policy::UploadPolicy;
