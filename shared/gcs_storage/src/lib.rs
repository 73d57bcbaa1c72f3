//! Google Cloud Storage URL signing
//!
//! This crate produces public and query-string-signed URLs for objects stored in
//! Google Cloud Storage. Signing is a local computation: the canonical request is
//! signed with the service account's RSA key (PKCS#1 v1.5, SHA-256) and no request
//! is made to the storage service.

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

pub mod canonical;
pub mod clock;
pub mod config;
pub mod credentials;
mod error;
pub mod identity;
pub mod presign;
pub mod storage;

pub use canonical::Verb;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::StorageConfig;
pub use credentials::{
    CredentialProvider, EnvCredentialProvider, NoCredentials, StaticCredentialProvider,
};
pub use error::{GcsError, GcsResult};
pub use identity::SigningIdentity;
pub use presign::{Expiry, PresignRequest, PresignResult, Presigner, DEFAULT_HOST};
pub use storage::{GcsStorage, PresignOptions, UrlOptions};
