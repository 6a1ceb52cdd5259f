//! Plain-data HTTP vocabulary shared by requests, responses and transports.
//!
//! # Design
//! Header maps are keyed by lowercased names. Folding case on insertion
//! means `Content-Type` and `content-type` can never both be present, so a
//! transport never has to decide which of two spellings wins.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Header map with lowercased names.
pub type Headers = BTreeMap<String, String>;

/// Query strings and route parameters are JSON-like mappings whose key order
/// is the order in which parameters are appended to the URL.
pub type Query = serde_json::Map<String, serde_json::Value>;

/// Timeout applied when a request does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the response body should be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseEncoding {
    /// Decode as UTF-8 text and parse as JSON when possible.
    #[default]
    Utf8,
    /// Keep the raw bytes (images).
    Binary,
}

/// How a file payload is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendFileAs {
    /// The file bytes are the request body.
    Data,
    /// The file is the `file` part of a `multipart/form-data` body.
    Form,
}

/// Build a header map from arbitrary-case pairs. Later pairs win when two
/// names differ only in case.
pub fn fold_headers<I, K, V>(pairs: I) -> Headers
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
        .collect()
}
