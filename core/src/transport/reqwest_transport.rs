//! Async transport backed by [`reqwest`].

use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use tracing::{debug, trace};

use super::{collect_headers, settle, InFlight, Payload, Transport};
use crate::error::RequestError;
use crate::events::Progress;
use crate::request::Request;
use crate::response::Response;

/// A [`Transport`] backed by a shared [`reqwest::Client`].
///
/// The body is streamed chunk by chunk, so download progress is reported as
/// it arrives. File uploads report a single upload notification once sent.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    in_flight: Arc<InFlight>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing [`reqwest::Client`] and its connection pool.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            in_flight: Arc::default(),
        }
    }

    /// Requests currently being sent.
    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    async fn exchange(&self, request: &Request) -> Result<Response, RequestError> {
        let id = request.id();
        let url = request
            .url(None)
            .map_err(|err| RequestError::transport(id, err.to_string()))?;
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .map_err(|err| RequestError::transport(id, err.to_string()))?;

        let mut builder = self
            .client
            .request(method, url.as_str())
            .timeout(request.timeout());
        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let payload = Payload::of(request)?;
        let upload_len = payload.upload_len();
        builder = match payload {
            Payload::Empty => builder,
            Payload::Body(bytes) | Payload::File(bytes) => builder.body(bytes),
            Payload::Form(bytes) => {
                let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name("file");
                builder.multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };

        let mut response = builder.send().await.map_err(|err| map_error(id, err))?;
        if let Some(len) = upload_len {
            request.notify_upload_progress(Progress::new(Some(len), len));
        }

        let status = response.status().as_u16();
        let headers = collect_headers(
            response
                .headers()
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_bytes())),
        );
        let total = response.content_length();

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|err| map_error(id, err))? {
            body.extend_from_slice(&chunk);
            trace!(id, received = body.len(), "response chunk");
            request.notify_download_progress(Progress::new(total, body.len() as u64));
        }

        settle(request, status, headers, body.freeze())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send_request(&self, request: &Request) -> Result<Response, RequestError> {
        self.in_flight
            .register(request)
            .run(request, self.exchange(request))
            .await
    }

    fn abort_request(&self, request: &Request) {
        if !self.in_flight.cancel(request.id()) {
            debug!(id = request.id(), "abort for a request that is not in flight");
        }
    }
}

fn map_error(id: u64, err: reqwest::Error) -> RequestError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    RequestError::transport(id, message)
}
