//! Error types module
//!
//! All upload failures are unified under the `UploadError` enum. Every variant
//! maps to a fixed, user-facing message via [`UploadError::client_message`];
//! nothing from this enum is allowed to escape the upload handler as an HTTP
//! fault.

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload directory is not writable: {0}")]
    DirectoryNotWritable(String),

    #[error("File is empty")]
    EmptyFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid file extension: '{extension}' (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Save failed: {0}")]
    SaveFailed(String),

    #[error("Content length unavailable")]
    LengthUnavailable,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl UploadError {
    /// Client-facing message. These strings are part of the response contract
    /// and must stay stable; internal detail goes to the logs, not the body.
    pub fn client_message(&self) -> String {
        match self {
            UploadError::DirectoryNotWritable(_) => {
                "Server error. Upload directory isn't writable.".to_string()
            }
            UploadError::EmptyFile => "File is empty".to_string(),
            UploadError::FileTooLarge { .. } => "File is too large".to_string(),
            UploadError::InvalidExtension { allowed, .. } => format!(
                "File has an invalid extension, it should be one of {}.",
                allowed.join(", ")
            ),
            UploadError::SaveFailed(_) => {
                "Could not save uploaded file. The upload was cancelled, or server error encountered"
                    .to_string()
            }
            UploadError::LengthUnavailable => {
                "Getting content length is not supported.".to_string()
            }
            UploadError::InvalidConfiguration(msg) => format!("Server misconfigured: {}", msg),
        }
    }
}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::SaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_extension_message_joins_allow_list() {
        let err = UploadError::InvalidExtension {
            extension: "gif".to_string(),
            allowed: vec!["jpg".to_string(), "png".to_string()],
        };
        assert_eq!(
            err.client_message(),
            "File has an invalid extension, it should be one of jpg, png."
        );
    }

    #[test]
    fn test_save_failed_message_is_fixed() {
        let err = UploadError::SaveFailed("disk full".to_string());
        assert_eq!(
            err.client_message(),
            "Could not save uploaded file. The upload was cancelled, or server error encountered"
        );
    }
}
