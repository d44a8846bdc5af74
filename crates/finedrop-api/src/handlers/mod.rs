pub mod progress;
pub mod upload;
