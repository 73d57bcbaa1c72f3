//! Canonical request construction for query-string signed URLs
//!
//! The signed string has the layout
//!
//! ```text
//! {verb}\n{content-md5}\n{content-type}\n{expires}\n{extension headers}{resource}
//! ```
//!
//! where `resource` is `/{bucket}/{object}` with the object path escaped by
//! [`escape_object_path`].

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Bytes left unescaped in object paths: RFC 3986 unreserved characters plus `/`
const OBJECT_PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// HTTP method a signed URL grants
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    /// Download the object
    #[default]
    Get,
    /// Upload the object
    Put,
    /// Delete the object
    Delete,
    /// Read object metadata
    Head,
}

/// Percent-encodes an object path, keeping `/` as a literal separator
#[must_use]
pub fn escape_object_path(path: &str) -> String {
    utf8_percent_encode(path, OBJECT_PATH_ENCODE_SET).to_string()
}

/// Builds the canonical resource `/{bucket}/{escaped object}`
#[must_use]
pub fn canonical_resource(bucket: &str, object: &str) -> String {
    format!("/{bucket}/{}", escape_object_path(object))
}

/// Parts of the request covered by the signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest<'a> {
    /// HTTP method
    pub verb: Verb,
    /// Base64 MD5 of the body the client must send, empty when unused
    pub content_md5: &'a str,
    /// Content type the client must send, empty when unused
    pub content_type: &'a str,
    /// Absolute expiry as Unix seconds
    pub expires_at: i64,
    /// `x-goog-*` headers the client must send
    pub extension_headers: &'a BTreeMap<String, String>,
    /// Canonical resource path
    pub resource: &'a str,
}

impl CanonicalRequest<'_> {
    /// Renders the exact byte sequence that gets signed
    #[must_use]
    pub fn string_to_sign(&self) -> String {
        let mut out = format!(
            "{}\n{}\n{}\n{}\n",
            self.verb, self.content_md5, self.content_type, self.expires_at
        );
        for (name, value) in canonical_headers(self.extension_headers) {
            out.push_str(&name);
            out.push(':');
            out.push_str(&value);
            out.push('\n');
        }
        out.push_str(self.resource);
        out
    }
}

/// Lower-cases header names, trims values and sorts by name
///
/// Names that collide after lower-casing are merged into one header with the
/// values joined by commas.
fn canonical_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut canonical: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = value.trim();
        canonical
            .entry(name.trim().to_ascii_lowercase())
            .and_modify(|merged| {
                merged.push(',');
                merged.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    canonical
}
