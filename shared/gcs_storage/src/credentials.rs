//! Signing identity discovery
//!
//! When a caller does not pass an explicit [`SigningIdentity`], the presigner
//! asks a [`CredentialProvider`]. [`EnvCredentialProvider`] follows the lookup
//! order of Google's client libraries:
//!
//! 1. `GOOGLE_CLOUD_KEYFILE_JSON` holding the key file contents
//! 2. `GOOGLE_CLOUD_KEYFILE` or `GOOGLE_APPLICATION_CREDENTIALS` holding a path
//! 3. the gcloud well-known file under `$HOME/.config/gcloud`

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{GcsError, GcsResult, SigningIdentity};

/// Environment variable holding the key file contents
pub const KEYFILE_JSON_VAR: &str = "GOOGLE_CLOUD_KEYFILE_JSON";
/// Environment variables holding a key file path, in lookup order
pub const KEYFILE_PATH_VARS: [&str; 2] = ["GOOGLE_CLOUD_KEYFILE", "GOOGLE_APPLICATION_CREDENTIALS"];

const WELL_KNOWN_FILE: &str = ".config/gcloud/application_default_credentials.json";

/// Capability to resolve a signing identity from the environment
pub trait CredentialProvider: Send + Sync {
    /// Returns the discovered identity, `Ok(None)` when nothing is configured
    ///
    /// # Errors
    ///
    /// Returns an error when credentials are configured but cannot be loaded
    fn signing_identity(&self) -> GcsResult<Option<SigningIdentity>>;
}

/// Provider that always returns the same identity
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider(SigningIdentity);

impl StaticCredentialProvider {
    /// Wraps `identity`
    #[must_use]
    pub const fn new(identity: SigningIdentity) -> Self {
        Self(identity)
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn signing_identity(&self) -> GcsResult<Option<SigningIdentity>> {
        Ok(Some(self.0.clone()))
    }
}

/// Provider that never finds credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn signing_identity(&self) -> GcsResult<Option<SigningIdentity>> {
        Ok(None)
    }
}

/// Provider reading service-account keys from environment variables and the
/// gcloud well-known file
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialProvider {
    home: Option<PathBuf>,
}

impl EnvCredentialProvider {
    /// Creates a provider that resolves the well-known file from `$HOME`
    #[must_use]
    pub fn new() -> Self {
        Self {
            home: env::var_os("HOME").map(PathBuf::from),
        }
    }

    /// Overrides the home directory used to find the well-known file
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    fn load_file(path: &Path) -> GcsResult<SigningIdentity> {
        let contents = fs::read_to_string(path).map_err(|e| {
            GcsError::CredentialDiscoveryError(format!(
                "failed to read credentials file {}: {e}",
                path.display()
            ))
        })?;
        SigningIdentity::from_service_account_json(&contents)
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn signing_identity(&self) -> GcsResult<Option<SigningIdentity>> {
        if let Some(json) = non_empty_var(KEYFILE_JSON_VAR) {
            let identity = SigningIdentity::from_service_account_json(&json)?;
            info!(source = KEYFILE_JSON_VAR, issuer = identity.issuer(), "Discovered signing credentials");
            return Ok(Some(identity));
        }

        for var in KEYFILE_PATH_VARS {
            if let Some(path) = non_empty_var(var) {
                let identity = Self::load_file(Path::new(&path))?;
                info!(source = var, issuer = identity.issuer(), "Discovered signing credentials");
                return Ok(Some(identity));
            }
        }

        if let Some(home) = &self.home {
            let path = home.join(WELL_KNOWN_FILE);
            if path.is_file() {
                let identity = Self::load_file(&path)?;
                info!(
                    source = %path.display(),
                    issuer = identity.issuer(),
                    "Discovered signing credentials"
                );
                return Ok(Some(identity));
            }
        }

        debug!("No signing credentials found in the environment");
        Ok(None)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
