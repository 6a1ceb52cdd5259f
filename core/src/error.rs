//! Error types for the Goong API client.
//!
//! # Design
//! Synchronous failures (misuse of the API, invalid service configuration)
//! are raised before any network activity and never carry a request. Failures
//! of an in-flight request are normalized into a single `RequestError`
//! envelope regardless of which transport produced them, so callers can match
//! on `ErrorKind` without knowing whether the request was aborted, rejected by
//! the server, or lost on the wire.

use std::fmt;

use bytes::Bytes;
use tracing::warn;

use crate::response::ResponseBody;
use crate::validator::ValidationError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by client, request and service operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The API was used incorrectly: a request without a path, a client
    /// without an API key, a second `send()`, an unresolved route parameter.
    #[error("{0}")]
    Usage(String),

    /// A service configuration did not match its schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A service configuration could not be turned into a JSON value.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request was sent and failed.
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl Error {
    /// The request failure, if this error came out of a `send()`.
    pub fn as_request_error(&self) -> Option<&RequestError> {
        match self {
            Error::Request(err) => Some(err),
            _ => None,
        }
    }
}

/// Category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The server answered with a status outside `200..400`.
    Http,
    /// The request was cancelled through `Request::abort`.
    Aborted,
    /// The transport failed before a status was received (connect, timeout,
    /// I/O, unsupported payload).
    Transport,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Http => "HttpError",
            ErrorKind::Aborted => "RequestAbortedError",
            ErrorKind::Transport => "TransportError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Envelope describing why a sent request did not produce a response.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestError {
    request_id: u64,
    kind: ErrorKind,
    status_code: Option<u16>,
    body: Option<ResponseBody>,
    message: Option<String>,
}

impl RequestError {
    /// Build an HTTP error from the raw status and body the server returned.
    ///
    /// The body is parsed as JSON when possible and kept as text otherwise.
    pub fn http(request_id: u64, status_code: u16, raw_body: &Bytes) -> Self {
        let body = parse_error_body(raw_body);
        Self::build(request_id, ErrorKind::Http, Some(status_code), body, None)
    }

    /// The error every pending `send()` resolves with after `abort()`.
    pub fn aborted(request_id: u64) -> Self {
        Self::build(request_id, ErrorKind::Aborted, None, None, None)
    }

    /// A failure below HTTP, described by the transport.
    pub fn transport(request_id: u64, message: impl Into<String>) -> Self {
        Self::build(
            request_id,
            ErrorKind::Transport,
            None,
            None,
            Some(message.into()),
        )
    }

    fn build(
        request_id: u64,
        kind: ErrorKind,
        status_code: Option<u16>,
        body: Option<ResponseBody>,
        message: Option<String>,
    ) -> Self {
        let message = message.or_else(|| derive_message(kind, body.as_ref()));
        Self {
            request_id,
            kind,
            status_code,
            body,
            message,
        }
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn body(&self) -> Option<&ResponseBody> {
        self.body.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_aborted(&self) -> bool {
        self.kind == ErrorKind::Aborted
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(status) = self.status_code {
            write!(f, " ({status})")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RequestError {}

fn parse_error_body(raw: &Bytes) -> Option<ResponseBody> {
    if raw.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(raw);
    match serde_json::from_str(&text) {
        Ok(value) => Some(ResponseBody::Json(value)),
        Err(err) => {
            warn!(error = %err, "error body is not JSON, keeping raw text");
            Some(ResponseBody::Text(text.into_owned()))
        }
    }
}

fn derive_message(kind: ErrorKind, body: Option<&ResponseBody>) -> Option<String> {
    match body {
        Some(ResponseBody::Text(text)) => return Some(text.clone()),
        Some(ResponseBody::Json(serde_json::Value::String(text))) => return Some(text.clone()),
        Some(ResponseBody::Json(value)) => {
            if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
                return Some(message.to_string());
            }
        }
        _ => {}
    }
    (kind == ErrorKind::Aborted).then(|| "Request aborted".to_string())
}
