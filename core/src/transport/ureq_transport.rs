//! Blocking transport backed by [`ureq`].
//!
//! Since ureq is a synchronous HTTP client, each exchange runs on tokio's
//! blocking pool. Aborting resolves the pending `send()` right away; the
//! blocking call itself is left to finish or hit its timeout, and its result
//! is discarded.

use std::io::Read as _;

use async_trait::async_trait;
use bytes::BytesMut;
use tracing::debug;

use super::{collect_headers, settle, InFlight, Payload, Transport};
use crate::error::RequestError;
use crate::events::Progress;
use crate::request::Request;
use crate::response::Response;

const READ_CHUNK: usize = 8 * 1024;

/// A [`Transport`] backed by [`ureq`] (blocking).
///
/// Multipart form uploads are not supported and fail with a transport
/// error.
#[derive(Debug, Default)]
pub struct UreqTransport {
    in_flight: InFlight,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests currently being sent.
    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send_request(&self, request: &Request) -> Result<Response, RequestError> {
        let registration = self.in_flight.register(request);
        let id = request.id();
        let blocking = request.clone();
        let task = tokio::task::spawn_blocking(move || exchange(&blocking));
        registration
            .run(request, async move {
                task.await
                    .map_err(|err| RequestError::transport(id, err.to_string()))?
            })
            .await
    }

    fn abort_request(&self, request: &Request) {
        if !self.in_flight.cancel(request.id()) {
            debug!(id = request.id(), "abort for a request that is not in flight");
        }
    }
}

fn exchange(request: &Request) -> Result<Response, RequestError> {
    let id = request.id();
    let url = request
        .url(None)
        .map_err(|err| RequestError::transport(id, err.to_string()))?;

    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(request.timeout()))
        // Status codes are turned into errors by `settle`.
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut builder = http::Request::builder()
        .method(request.method().as_str())
        .uri(url.as_str());
    for (name, value) in request.headers() {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let payload = Payload::of(request)?;
    let upload_len = payload.upload_len();
    let result = match payload {
        Payload::Empty => {
            let req = builder
                .body(())
                .map_err(|err| RequestError::transport(id, err.to_string()))?;
            agent.run(req)
        }
        Payload::Body(bytes) | Payload::File(bytes) => {
            let req = builder
                .body(bytes.to_vec())
                .map_err(|err| RequestError::transport(id, err.to_string()))?;
            agent.run(req)
        }
        Payload::Form(_) => {
            return Err(RequestError::transport(
                id,
                "multipart form uploads are not supported by the ureq transport",
            ))
        }
    };

    let response = result.map_err(|err| map_error(id, err))?;
    if let Some(len) = upload_len {
        request.notify_upload_progress(Progress::new(Some(len), len));
    }

    let (parts, body) = response.into_parts();
    let headers = collect_headers(
        parts
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_bytes())),
    );
    let total = headers
        .get("content-length")
        .and_then(|length| length.parse::<u64>().ok());

    let mut reader = body.into_reader();
    let mut raw = BytesMut::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let read = reader
            .read(&mut chunk)
            .map_err(|err| RequestError::transport(id, err.to_string()))?;
        if read == 0 {
            break;
        }
        raw.extend_from_slice(&chunk[..read]);
        request.notify_download_progress(Progress::new(total, raw.len() as u64));
    }

    settle(request, parts.status.as_u16(), headers, raw.freeze())
}

fn map_error(id: u64, err: ureq::Error) -> RequestError {
    let message = match err {
        ureq::Error::Timeout(_) => "request timed out".to_string(),
        ureq::Error::HostNotFound => "connection failed: host not found".to_string(),
        ureq::Error::Io(err) => format!("connection failed: {err}"),
        other => other.to_string(),
    };
    RequestError::transport(id, message)
}
