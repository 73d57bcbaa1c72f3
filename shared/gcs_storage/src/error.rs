//! Error types for URL signing operations

use thiserror::Error;

/// Result type for URL signing operations
pub type GcsResult<T> = Result<T, GcsError>;

/// Errors that can occur while generating object URLs
///
/// All variants describe misconfiguration and are not retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GcsError {
    /// The private key is malformed, unreadable or failed to sign
    #[error("Signing key error: {0}")]
    SigningKeyError(String),

    /// No signing identity was supplied and none could be discovered
    #[error("Credential discovery error: {0}")]
    CredentialDiscoveryError(String),

    /// The requested expiry is not in the future
    #[error("Invalid expiry: {0}")]
    InvalidExpiryError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<rsa::pkcs8::Error> for GcsError {
    fn from(error: rsa::pkcs8::Error) -> Self {
        Self::SigningKeyError(format!("invalid PKCS#8 private key: {error}"))
    }
}

impl From<rsa::pkcs1::Error> for GcsError {
    fn from(error: rsa::pkcs1::Error) -> Self {
        Self::SigningKeyError(format!("invalid PKCS#1 private key: {error}"))
    }
}

impl From<rsa::signature::Error> for GcsError {
    fn from(error: rsa::signature::Error) -> Self {
        Self::SigningKeyError(format!("failed to sign request: {error}"))
    }
}
