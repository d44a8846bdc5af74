//! Configuration module
//!
//! Environment-driven configuration for the upload service. Everything has a
//! sane default except the upload directory, which must be set explicitly.

use std::env;
use std::path::PathBuf;

use crate::byte_size::parse_size;
use crate::policy::UploadPolicy;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_MAX_FILE_SIZE: &str = "10M";
const DEFAULT_MAX_REQUEST_BODY_SIZE: &str = "25M";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub upload_dir: PathBuf,
    pub allowed_extensions: Vec<String>,
    /// Policy-level size limit in bytes; `None` means no limit.
    pub size_limit: Option<u64>,
    pub allow_overwrite: bool,
    /// Hard cap on the accepted request body, enforced by the HTTP layer.
    pub max_request_body_size: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .map_err(|_| anyhow::anyhow!("UPLOAD_DIR must be set"))?;

        let allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        // "0" is the explicit no-limit sentinel.
        let size_limit = match env::var("MAX_FILE_SIZE")
            .unwrap_or_else(|_| DEFAULT_MAX_FILE_SIZE.to_string())
        {
            s if s.trim() == "0" => None,
            s => Some(parse_size(&s)?),
        };

        let max_request_body_size = parse_size(
            &env::var("MAX_REQUEST_BODY_SIZE")
                .unwrap_or_else(|_| DEFAULT_MAX_REQUEST_BODY_SIZE.to_string()),
        )?;

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            upload_dir,
            allowed_extensions,
            size_limit,
            allow_overwrite: env::var("ALLOW_OVERWRITE")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            max_request_body_size,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.upload_dir.is_absolute() {
            return Err(anyhow::anyhow!(
                "UPLOAD_DIR must be an absolute path (got {})",
                self.upload_dir.display()
            ));
        }

        // A policy limit above the HTTP-layer body cap would accept uploads
        // the server can never receive in full. Refuse to start instead.
        if let Some(limit) = self.size_limit {
            if self.max_request_body_size < limit {
                return Err(anyhow::anyhow!(
                    "MAX_REQUEST_BODY_SIZE ({} bytes) is smaller than MAX_FILE_SIZE ({} bytes); \
                     increase MAX_REQUEST_BODY_SIZE",
                    self.max_request_body_size,
                    limit
                ));
            }
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Build the per-request upload policy from this configuration.
    pub fn policy(&self) -> UploadPolicy {
        UploadPolicy::new(
            self.upload_dir.clone(),
            self.allowed_extensions.clone(),
            self.size_limit,
        )
    }
}
