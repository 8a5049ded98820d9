use std::path::Path;

use serde::Deserialize;
use starmig_bucket::S3Config;

use crate::error::{PipelineError, Result};

/// Options supplied once at process start: where extracts live, where
/// published tables go, and how to reach the destination bucket when the
/// warehouse is not on the local filesystem.
#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    pub source_root: String,
    pub destination_root: String,
    #[serde(default)]
    pub aws: Option<AwsSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AwsSettings {
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl WarehouseConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|err| PipelineError::Configuration(format!("{}: {}", path.display(), err)))
    }

    /// Assembles configuration from `STARMIG_*` and `AWS_*` environment
    /// variables when no config file is given. The destination is taken to be
    /// an S3 prefix whenever a bucket is named, a local directory otherwise.
    pub fn from_env() -> Result<Self> {
        let source_root = require_env("STARMIG_SOURCE_ROOT")?;
        let destination_root = require_env("STARMIG_DESTINATION_ROOT")?;
        let aws = std::env::var("STARMIG_BUCKET").ok().map(|bucket| AwsSettings {
            bucket,
            region: std::env::var("STARMIG_REGION").unwrap_or_else(|_| default_region()),
            endpoint: std::env::var("STARMIG_ENDPOINT").ok(),
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
            force_path_style: false,
        });

        Ok(Self {
            source_root,
            destination_root,
            aws,
        })
    }
}

impl AwsSettings {
    pub fn to_s3_config(&self) -> S3Config {
        S3Config {
            bucket: self.bucket.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            force_path_style: self.force_path_style,
        }
    }
}

fn require_env(name: &'static str) -> Result<String> {
    std::env::var(name).map_err(|_| PipelineError::Configuration(format!("{name} must be set")))
}
