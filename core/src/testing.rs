//! Fixtures for unit tests.

use async_trait::async_trait;

use crate::client::{Client, ClientConfig};
use crate::error::RequestError;
use crate::request::{Request, RequestOptions};
use crate::response::Response;
use crate::transport::Transport;

/// Fails every request without touching the network.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InertTransport;

#[async_trait]
impl Transport for InertTransport {
    async fn send_request(&self, request: &Request) -> Result<Response, RequestError> {
        Err(RequestError::transport(request.id(), "inert transport"))
    }

    fn abort_request(&self, _request: &Request) {}
}

pub(crate) fn inert_client() -> Client {
    Client::with_transport(ClientConfig::new("test-key"), InertTransport)
        .expect("client with an API key")
}

pub(crate) fn inert_request(path: &str) -> Request {
    inert_client()
        .create_request(RequestOptions::get(path))
        .expect("request with a path")
}
