//! Pluggable transports that put a [`Request`] on the wire.
//!
//! # Design
//! A transport owns the actual I/O and nothing else. URL building, response
//! decoding and the status-to-error rule live here as shared helpers so the
//! async and the blocking backend cannot drift apart:
//!
//! - [`settle`] turns a status, headers and body into a response or an
//!   HTTP error (`200..400` succeeds).
//! - [`InFlight`] tracks cancellable requests so `abort_request` can end a
//!   pending `send_request` with an aborted error.
//! - [`Payload`] decides what goes into the request body.

use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::trace;

use crate::error::RequestError;
use crate::http::{Headers, SendFileAs};
use crate::request::Request;
use crate::response::Response;

#[cfg(feature = "reqwest-transport")]
mod reqwest_transport;
#[cfg(feature = "reqwest-transport")]
pub use reqwest_transport::ReqwestTransport;

#[cfg(feature = "ureq-transport")]
mod ureq_transport;
#[cfg(feature = "ureq-transport")]
pub use ureq_transport::UreqTransport;

/// Sends requests and cancels them.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Perform the HTTP exchange for `request`.
    async fn send_request(&self, request: &Request) -> Result<Response, RequestError>;

    /// Cancel a pending `send_request` for `request`. Must not block.
    fn abort_request(&self, request: &Request);
}

/// Build the outcome of a completed exchange.
pub fn settle(
    request: &Request,
    status_code: u16,
    headers: Headers,
    body: Bytes,
) -> Result<Response, RequestError> {
    trace!(id = request.id(), status = status_code, bytes = body.len(), "settling response");
    if (200..400).contains(&status_code) {
        Ok(Response::new(request, status_code, headers, body))
    } else {
        Err(RequestError::http(request.id(), status_code, &body))
    }
}

/// Fold raw header pairs into a [`Headers`] map. Repeated names are joined
/// with `", "` in arrival order.
pub fn collect_headers<'a, I>(pairs: I) -> Headers
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut headers = Headers::new();
    for (name, value) in pairs {
        let value = String::from_utf8_lossy(value);
        headers
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }
    headers
}

/// What a request puts in its body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    /// Serialized JSON, or a string body verbatim.
    Body(Bytes),
    /// Raw file bytes as the body.
    File(Bytes),
    /// File bytes as the `file` part of a multipart form.
    Form(Bytes),
}

impl Payload {
    /// A file takes precedence over a body.
    pub fn of(request: &Request) -> Result<Self, RequestError> {
        if let Some(file) = request.file() {
            return Ok(match request.send_file_as() {
                Some(SendFileAs::Form) => Payload::Form(file.clone()),
                _ => Payload::File(file.clone()),
            });
        }
        match request.body() {
            None => Ok(Payload::Empty),
            Some(serde_json::Value::String(text)) => Ok(Payload::Body(Bytes::from(text.clone()))),
            Some(value) => serde_json::to_vec(value)
                .map(|bytes| Payload::Body(Bytes::from(bytes)))
                .map_err(|err| RequestError::transport(request.id(), err.to_string())),
        }
    }

    /// Size of an upload worth reporting progress for.
    pub fn upload_len(&self) -> Option<u64> {
        match self {
            Payload::File(bytes) | Payload::Form(bytes) => Some(bytes.len() as u64),
            Payload::Empty | Payload::Body(_) => None,
        }
    }
}

/// Cancellation registry of pending requests, keyed by request id.
#[derive(Debug, Default)]
pub struct InFlight {
    pending: DashMap<u64, oneshot::Sender<()>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `request` until the returned guard is dropped.
    pub fn register(&self, request: &Request) -> Registration<'_> {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(request.id(), tx);
        trace!(id = request.id(), "registered in-flight request");
        Registration {
            registry: self,
            id: request.id(),
            cancelled: rx,
        }
    }

    /// Signal the pending request `id`. Returns whether it was pending.
    pub fn cancel(&self, id: u64) -> bool {
        match self.pending.remove(&id) {
            Some((_, tx)) => {
                trace!(id, "cancelling in-flight request");
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Membership of one request in an [`InFlight`] registry.
pub struct Registration<'a> {
    registry: &'a InFlight,
    id: u64,
    cancelled: oneshot::Receiver<()>,
}

impl Registration<'_> {
    /// Drive `exchange` unless the request is, or becomes, aborted.
    pub async fn run<F>(mut self, request: &Request, exchange: F) -> Result<Response, RequestError>
    where
        F: Future<Output = Result<Response, RequestError>>,
    {
        let id = self.id;
        if request.is_aborted() {
            return Err(RequestError::aborted(id));
        }
        tokio::select! {
            _ = &mut self.cancelled => Err(RequestError::aborted(id)),
            outcome = exchange => outcome,
        }
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if self.registry.pending.remove(&self.id).is_some() {
            trace!(id = self.id, "released in-flight request");
        }
    }
}

impl fmt::Debug for Registration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}
