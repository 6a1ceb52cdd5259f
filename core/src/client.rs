//! Credentials, origin and transport shared by every request.
//!
//! # Design
//! `Client` holds no mutable state. It is an `Arc` handle, so services and
//! requests keep their own clone instead of borrowing it. The transport is a
//! trait object chosen once at construction: the async `reqwest` transport
//! by default, the blocking `ureq` transport when that is the only one
//! compiled in, or any caller-supplied [`Transport`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::request::{Request, RequestOptions};
use crate::transport::Transport;

/// Public endpoint of the Goong REST API.
pub const API_ORIGIN: &str = "https://rsapi.goong.io";

/// Serializable client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

struct ClientInner {
    access_token: String,
    origin: String,
    transport: Arc<dyn Transport>,
}

/// Entry point for building requests against the API.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// A client using the default transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// A client sending through `transport`.
    pub fn with_transport<T>(config: ClientConfig, transport: T) -> Result<Self>
    where
        T: Transport + 'static,
    {
        Self::builder().config(config).transport(transport).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn access_token(&self) -> &str {
        &self.inner.access_token
    }

    pub fn origin(&self) -> &str {
        &self.inner.origin
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    /// A new, unsent request bound to this client.
    pub fn create_request(&self, options: RequestOptions) -> Result<Request> {
        Request::new(self, options)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("origin", &self.inner.origin)
            .field("access_token", &"<redacted>")
            .field("transport", &self.inner.transport)
            .finish()
    }
}

/// Builder for [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    access_token: Option<String>,
    origin: Option<String>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Take the token and origin from `config`.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.access_token = Some(config.access_token);
        if config.origin.is_some() {
            self.origin = config.origin;
        }
        self
    }

    pub fn transport<T>(self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.shared_transport(Arc::new(transport))
    }

    /// Use a transport that is shared with other clients.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Client> {
        let access_token = self.access_token.unwrap_or_default();
        if access_token.is_empty() {
            return Err(Error::Usage(
                "Cannot create a client without an API key".to_string(),
            ));
        }
        let origin = self
            .origin
            .filter(|origin| !origin.is_empty())
            .map(|origin| origin.trim_end_matches('/').to_string())
            .unwrap_or_else(|| API_ORIGIN.to_string());
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };
        Ok(Client {
            inner: Arc::new(ClientInner {
                access_token,
                origin,
                transport,
            }),
        })
    }
}

#[cfg(feature = "reqwest-transport")]
fn default_transport() -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(crate::transport::ReqwestTransport::new()))
}

#[cfg(all(feature = "ureq-transport", not(feature = "reqwest-transport")))]
fn default_transport() -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(crate::transport::UreqTransport::new()))
}

#[cfg(not(any(feature = "reqwest-transport", feature = "ureq-transport")))]
fn default_transport() -> Result<Arc<dyn Transport>> {
    Err(Error::Usage(
        "No transport compiled in; enable a transport feature or pass one to the builder"
            .to_string(),
    ))
}
