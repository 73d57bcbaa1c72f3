//! Query-string URL signing
//!
//! [`Presigner`] turns a [`PresignRequest`] into a time-limited URL of the form
//!
//! ```text
//! https://storage.googleapis.com/{bucket}/{object}?GoogleAccessId=..&Expires=..&Signature=..
//! ```
//!
//! The signature covers the canonical request built in [`crate::canonical`].
//! Nothing is sent over the network, so the object does not need to exist.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::{
    canonical::{canonical_resource, escape_object_path, CanonicalRequest},
    Clock, CredentialProvider, GcsError, GcsResult, SigningIdentity, SystemClock, Verb,
};

/// Host serving the storage XML API
pub const DEFAULT_HOST: &str = "storage.googleapis.com";

/// When a signed URL stops being valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Absolute instant
    At(DateTime<Utc>),
    /// Offset from the signing time
    In(Duration),
}

impl Expiry {
    /// Resolves the expiry to Unix seconds relative to `now`
    ///
    /// Durations are added to the whole second of `now`, sub-second parts of
    /// the duration are dropped.
    ///
    /// # Errors
    ///
    /// Returns `GcsError::InvalidExpiryError` if the result is not strictly
    /// after `now` or overflows
    pub fn resolve(self, now: DateTime<Utc>) -> GcsResult<i64> {
        let now_secs = now.timestamp();
        let expires_at = match self {
            Self::At(instant) => instant.timestamp(),
            Self::In(duration) => i64::try_from(duration.as_secs())
                .ok()
                .and_then(|secs| now_secs.checked_add(secs))
                .ok_or_else(|| {
                    GcsError::InvalidExpiryError(format!("duration {duration:?} is too large"))
                })?,
        };

        if expires_at <= now_secs {
            return Err(GcsError::InvalidExpiryError(format!(
                "expiry {expires_at} is not after signing time {now_secs}"
            )));
        }

        Ok(expires_at)
    }
}

/// A single URL signing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    /// Full object name inside the bucket
    pub object_key: String,
    /// Method the URL grants
    pub verb: Verb,
    /// Expiry of the URL
    pub expiry: Expiry,
    /// Query parameters appended after the signature, in order
    pub extra_query_params: Vec<(String, String)>,
    /// Content type the client must send
    pub content_type: Option<String>,
    /// Base64 MD5 of the body the client must send
    pub content_md5: Option<String>,
    /// `x-goog-*` headers the client must send
    pub extension_headers: BTreeMap<String, String>,
}

impl PresignRequest {
    /// Creates a GET request for `object_key`
    #[must_use]
    pub fn new(object_key: impl Into<String>, expiry: Expiry) -> Self {
        Self {
            object_key: object_key.into(),
            verb: Verb::Get,
            expiry,
            extra_query_params: Vec::new(),
            content_type: None,
            content_md5: None,
            extension_headers: BTreeMap::new(),
        }
    }

    /// Sets the HTTP method
    #[must_use]
    pub fn with_verb(mut self, verb: Verb) -> Self {
        self.verb = verb;
        self
    }

    /// Appends a query parameter, e.g. `response-content-disposition`
    #[must_use]
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_query_params.push((name.into(), value.into()));
        self
    }
}

/// Outcome of signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignResult {
    /// Absolute signed URL
    pub url: String,
    /// Form fields, always empty for query-string signing
    pub fields: BTreeMap<String, String>,
}

/// Stateless URL signer
#[derive(Clone)]
pub struct Presigner {
    credentials: Arc<dyn CredentialProvider>,
    clock: Arc<dyn Clock>,
    require_explicit_identity: bool,
}

impl Presigner {
    /// Creates a presigner using the system clock
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            credentials,
            clock: Arc::new(SystemClock),
            require_explicit_identity: false,
        }
    }

    /// Replaces the time source
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Refuses to fall back to discovered credentials when set
    #[must_use]
    pub fn require_explicit_identity(mut self, required: bool) -> Self {
        self.require_explicit_identity = required;
        self
    }

    /// Signs `request` for an object in `bucket`
    ///
    /// When `identity` is `None` the configured [`CredentialProvider`] is used.
    /// With a `host_override` the URL is `https://{host}/{object}` (the host
    /// maps to the bucket), while the signature still covers `/{bucket}/{object}`.
    ///
    /// # Errors
    ///
    /// Returns `GcsError::ConfigError` if `bucket` is empty
    /// Returns `GcsError::CredentialDiscoveryError` if no identity is available
    /// Returns `GcsError::InvalidExpiryError` if the expiry is not in the future
    /// Returns `GcsError::SigningKeyError` if signing fails
    pub fn presign(
        &self,
        bucket: &str,
        request: &PresignRequest,
        identity: Option<&SigningIdentity>,
        host_override: Option<&str>,
    ) -> GcsResult<PresignResult> {
        if bucket.trim().is_empty() {
            return Err(GcsError::ConfigError("bucket name must not be empty".to_string()));
        }

        let discovered;
        let identity = match identity {
            Some(identity) => identity,
            None => {
                discovered = self.discover_identity()?;
                &discovered
            }
        };

        let expires_at = request.expiry.resolve(self.clock.now())?;

        let resource = canonical_resource(bucket, &request.object_key);
        let string_to_sign = CanonicalRequest {
            verb: request.verb,
            content_md5: request.content_md5.as_deref().unwrap_or_default(),
            content_type: request.content_type.as_deref().unwrap_or_default(),
            expires_at,
            extension_headers: &request.extension_headers,
            resource: &resource,
        }
        .string_to_sign();

        let signature = STANDARD.encode(identity.sign(string_to_sign.as_bytes())?);

        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("GoogleAccessId", identity.issuer())
            .append_pair("Expires", &expires_at.to_string())
            .append_pair("Signature", &signature);
        for (name, value) in &request.extra_query_params {
            query.append_pair(name, value);
        }

        let base = host_override.map_or_else(
            || format!("https://{DEFAULT_HOST}{resource}"),
            |host| {
                format!(
                    "https://{}/{}",
                    host.trim_end_matches('/'),
                    escape_object_path(&request.object_key)
                )
            },
        );
        let url = format!("{base}?{}", query.finish());

        debug!(
            bucket,
            object = %request.object_key,
            verb = %request.verb,
            expires_at,
            host = host_override.unwrap_or(DEFAULT_HOST),
            "Generated signed URL"
        );

        Ok(PresignResult {
            url,
            fields: BTreeMap::new(),
        })
    }

    fn discover_identity(&self) -> GcsResult<SigningIdentity> {
        if self.require_explicit_identity {
            warn!("Signing identity required but none was supplied");
            return Err(GcsError::CredentialDiscoveryError(
                "an explicit signing identity is required".to_string(),
            ));
        }

        self.credentials.signing_identity()?.ok_or_else(|| {
            GcsError::CredentialDiscoveryError(
                "no signing credentials found in the environment".to_string(),
            )
        })
    }
}
