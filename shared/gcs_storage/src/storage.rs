//! Bucket-level URL generation
//!
//! [`GcsStorage`] applies the bucket configuration (prefix, CDN host, default
//! expiry) on top of the [`Presigner`].

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use crate::{
    canonical::escape_object_path, Clock, CredentialProvider, Expiry, GcsError, GcsResult,
    PresignRequest, PresignResult, Presigner, SigningIdentity, StorageConfig, Verb, DEFAULT_HOST,
};

/// Options for [`GcsStorage::url`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlOptions {
    /// Sign the URL with discovered credentials, valid for this long
    pub expires: Option<Duration>,
}

/// Options for [`GcsStorage::presign`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresignOptions {
    /// PEM private key, must be given together with `issuer`
    pub signing_key: Option<String>,
    /// Service-account email, must be given together with `signing_key`
    pub issuer: Option<String>,
    /// HTTP method, GET by default
    pub method: Verb,
    /// Lifetime of the URL, the configured default when unset
    pub expires_in: Option<Duration>,
    /// Content type the client must send
    pub content_type: Option<String>,
    /// Base64 MD5 of the body the client must send
    pub content_md5: Option<String>,
    /// `x-goog-*` headers the client must send
    pub headers: BTreeMap<String, String>,
    /// Extra query parameters appended after the signature
    pub query: Vec<(String, String)>,
}

impl PresignOptions {
    /// Signs with an explicit key instead of discovered credentials
    #[must_use]
    pub fn with_signing_key(
        mut self,
        signing_key: impl Into<String>,
        issuer: impl Into<String>,
    ) -> Self {
        self.signing_key = Some(signing_key.into());
        self.issuer = Some(issuer.into());
        self
    }

    /// Sets the HTTP method
    #[must_use]
    pub fn with_method(mut self, method: Verb) -> Self {
        self.method = method;
        self
    }

    /// Sets the lifetime of the URL
    #[must_use]
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    fn identity(&self) -> GcsResult<Option<SigningIdentity>> {
        match (&self.signing_key, &self.issuer) {
            (Some(key), Some(issuer)) => SigningIdentity::from_pem(issuer.as_str(), key).map(Some),
            (None, None) => Ok(None),
            _ => Err(GcsError::SigningKeyError(
                "signing_key and issuer must be given together".to_string(),
            )),
        }
    }
}

/// URL generation for one bucket
#[derive(Clone)]
pub struct GcsStorage {
    config: StorageConfig,
    presigner: Presigner,
}

impl GcsStorage {
    /// Creates a storage for `config`, discovering signing identities through
    /// `credentials` when none is passed explicitly
    #[must_use]
    pub fn new(config: StorageConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        let presigner = Presigner::new(credentials)
            .require_explicit_identity(config.require_explicit_identity);
        Self { config, presigner }
    }

    /// Replaces the time source used to resolve expiries
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.presigner = self.presigner.with_clock(clock);
        self
    }

    /// Bucket name
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Full object name for `key`, including the configured prefix
    #[must_use]
    pub fn object_name(&self, key: &str) -> String {
        match self.config.prefix.as_deref().map(|p| p.trim_matches('/')) {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}/{key}"),
            _ => key.to_string(),
        }
    }

    /// URL of the object stored under `key`
    ///
    /// Without `expires` this is the public URL, which only works for publicly
    /// readable objects. With `expires` a GET URL signed with discovered
    /// credentials is returned.
    ///
    /// # Errors
    ///
    /// Returns `GcsError::ConfigError` if the bucket name is empty, and the
    /// errors of [`Presigner::presign`] when signing
    pub fn url(&self, key: &str, options: &UrlOptions) -> GcsResult<String> {
        if self.config.bucket.trim().is_empty() {
            return Err(GcsError::ConfigError("bucket name must not be empty".to_string()));
        }

        if let Some(expires) = options.expires {
            let request = PresignRequest::new(self.object_name(key), Expiry::In(expires));
            let result = self.presigner.presign(
                &self.config.bucket,
                &request,
                None,
                self.config.host.as_deref(),
            )?;
            return Ok(result.url);
        }

        let object = escape_object_path(&self.object_name(key));
        Ok(match self.config.host.as_deref() {
            Some(host) => format!("https://{}/{object}", host.trim_end_matches('/')),
            None => format!("https://{DEFAULT_HOST}/{}/{object}", self.config.bucket),
        })
    }

    /// Signed URL granting `options.method` on the object stored under `key`
    ///
    /// # Errors
    ///
    /// Returns `GcsError::SigningKeyError` if only one of `signing_key` and
    /// `issuer` is given or the key is invalid, and the errors of
    /// [`Presigner::presign`]
    pub fn presign(&self, key: &str, options: PresignOptions) -> GcsResult<PresignResult> {
        let identity = options.identity()?;
        let expires_in = options
            .expires_in
            .unwrap_or_else(|| self.config.presign_expiry());

        let request = PresignRequest {
            object_key: self.object_name(key),
            verb: options.method,
            expiry: Expiry::In(expires_in),
            extra_query_params: options.query,
            content_type: options.content_type,
            content_md5: options.content_md5,
            extension_headers: options.headers,
        };

        self.presigner.presign(
            &self.config.bucket,
            &request,
            identity.as_ref(),
            self.config.host.as_deref(),
        )
    }
}
