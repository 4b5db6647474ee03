use serde::{Deserialize, Serialize};
use std::env;

use crate::config::env_or;

/// Default AWS region of the dataset buckets.
pub const DEFAULT_REGION: &str = "eu-north-1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// When false, datasets are fetched over plain HTTP only
    pub enabled: bool,
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack)
    pub endpoint: Option<String>,
    /// Static credentials; the default AWS credential chain is used when unset
    pub access_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    pub path_style: bool,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            path_style: false,
        }
    }
}

impl ObjectStoreConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Self {
            enabled: env_or("S3_ENABLED", true),
            region: env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            access_key: env::var("AWS_ACCESS_KEY_ID").ok().filter(|s| !s.is_empty()),
            secret_key: env::var("AWS_SECRET_ACCESS_KEY").ok().filter(|s| !s.is_empty()),
            path_style: env_or("S3_PATH_STYLE", false),
        };

        if config.access_key.is_some() != config.secret_key.is_some() {
            anyhow::bail!(
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"
            );
        }

        Ok(config)
    }

    pub fn for_minio(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            region: "us-east-1".to_string(),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            path_style: true,
            ..Self::default()
        }
    }

    /// Static credential pair, if configured
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        self.access_key.as_deref().zip(self.secret_key.as_deref())
    }
}
