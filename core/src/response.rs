//! Response envelope and pagination.
//!
//! # Design
//! A `Response` is derived once from what the transport received and never
//! changes afterwards. It does not hold its request (the request holds the
//! response); instead it keeps the request's original construction options,
//! which is all `next_page` needs to build the follow-up request.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::http::{Headers, ResponseEncoding};
use crate::links::{parse_link_header, Link, Links};
use crate::request::{Request, RequestOverrides, Template};

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// UTF-8 text that is not valid JSON.
    Text(String),
    /// Raw bytes of a response requested with [`ResponseEncoding::Binary`].
    Binary(Bytes),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// A successful (status `200..400`) response.
#[derive(Debug, Clone)]
pub struct Response {
    request_id: u64,
    template: Arc<Template>,
    status_code: u16,
    headers: Headers,
    raw_body: Bytes,
    body: ResponseBody,
    links: Links,
}

impl Response {
    /// Wrap what a transport received for `request`.
    ///
    /// `headers` must already be keyed by lowercased names. An empty UTF-8
    /// body decodes as an empty JSON object.
    pub fn new(request: &Request, status_code: u16, headers: Headers, raw_body: Bytes) -> Self {
        let body = decode_body(request.encoding(), &raw_body);
        let links = headers
            .get("link")
            .map(|header| parse_link_header(header))
            .unwrap_or_default();
        Self {
            request_id: request.id(),
            template: request.template(),
            status_code,
            headers,
            raw_body,
            body,
            links,
        }
    }

    /// Id of the request that produced this response.
    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn raw_body(&self) -> &Bytes {
        &self.raw_body
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Deserialize the JSON body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.raw_body)?)
    }

    /// Pagination relations from the `Link` header.
    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.get(rel)
    }

    pub fn has_next_page(&self) -> bool {
        self.links.contains_key("next")
    }

    /// A fresh, unsent request for the `next` relation: the original request
    /// configuration with its path replaced by the link target.
    pub fn next_page(&self) -> Option<Request> {
        let next = self.links.get("next")?;
        let overrides = RequestOverrides {
            path: Some(next.url.clone()),
            ..RequestOverrides::default()
        };
        Some(Request::from_template(&self.template, overrides))
    }
}

fn decode_body(encoding: ResponseEncoding, raw: &Bytes) -> ResponseBody {
    if encoding == ResponseEncoding::Binary {
        return ResponseBody::Binary(raw.clone());
    }
    if raw.is_empty() {
        return ResponseBody::Json(Value::Object(Default::default()));
    }
    match serde_json::from_slice(raw) {
        Ok(value) => ResponseBody::Json(value),
        Err(err) => {
            warn!(error = %err, "response body is not JSON, keeping raw text");
            ResponseBody::Text(String::from_utf8_lossy(raw).into_owned())
        }
    }
}
