//! Storage configuration

use std::{env, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{GcsError, GcsResult};

/// Default lifetime of presigned URLs in seconds
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 300;

/// Bucket and URL settings for a [`crate::GcsStorage`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket name
    pub bucket: String,
    /// Prefix prepended to every object key
    #[serde(default)]
    pub prefix: Option<String>,
    /// Host used instead of `storage.googleapis.com/{bucket}`, e.g. a CDN
    #[serde(default)]
    pub host: Option<String>,
    /// Lifetime of URLs from `presign` when none is given
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,
    /// Refuse to sign with discovered credentials
    #[serde(default)]
    pub require_explicit_identity: bool,
}

const fn default_presign_expiry_secs() -> u64 {
    DEFAULT_PRESIGN_EXPIRY_SECS
}

impl StorageConfig {
    /// Creates a configuration for `bucket` with defaults for everything else
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: None,
            host: None,
            presign_expiry_secs: DEFAULT_PRESIGN_EXPIRY_SECS,
            require_explicit_identity: false,
        }
    }

    /// Loads the configuration from environment variables
    ///
    /// * `GCS_BUCKET` - bucket name (required)
    /// * `GCS_PREFIX` - object key prefix
    /// * `GCS_HOST` - CDN host
    /// * `GCS_PRESIGN_EXPIRY_SECS` - default presign expiry, 300 when unset
    /// * `GCS_REQUIRE_EXPLICIT_IDENTITY` - `true` to disable credential discovery
    ///
    /// # Errors
    ///
    /// Returns `GcsError::ConfigError` if `GCS_BUCKET` is missing or a value
    /// cannot be parsed
    pub fn from_env() -> GcsResult<Self> {
        let bucket = optional_var("GCS_BUCKET").ok_or_else(|| {
            GcsError::ConfigError("GCS_BUCKET environment variable not set".to_string())
        })?;

        let presign_expiry_secs = match optional_var("GCS_PRESIGN_EXPIRY_SECS") {
            Some(value) => value.parse::<u64>().map_err(|e| {
                GcsError::ConfigError(format!("invalid GCS_PRESIGN_EXPIRY_SECS `{value}`: {e}"))
            })?,
            None => DEFAULT_PRESIGN_EXPIRY_SECS,
        };

        let require_explicit_identity = match optional_var("GCS_REQUIRE_EXPLICIT_IDENTITY") {
            Some(value) => value.to_lowercase().parse::<bool>().map_err(|e| {
                GcsError::ConfigError(format!(
                    "invalid GCS_REQUIRE_EXPLICIT_IDENTITY `{value}`: {e}"
                ))
            })?,
            None => false,
        };

        Ok(Self {
            bucket,
            prefix: optional_var("GCS_PREFIX"),
            host: optional_var("GCS_HOST"),
            presign_expiry_secs,
            require_explicit_identity,
        })
    }

    /// Lifetime of URLs from `presign` when none is given
    #[must_use]
    pub const fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
