//! The request entity: configuration, URL building, single-send dispatch,
//! abort and notifications.
//!
//! # Design
//! `Request` is a cheap handle (`Arc`) so the same request can be sent from
//! one task and aborted from another. Cloning the handle does *not* create a
//! new request; [`Request::duplicate`] and [`Request::extend`] do, always
//! starting from the original construction options.
//!
//! A request is sent at most once. The `sent` flag flips synchronously when
//! [`Request::send`] is called, before the returned future is polled, so a
//! second call fails without ever reaching the transport.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::client::Client;
use crate::error::{Error, RequestError, Result};
use crate::events::{EventKind, Listeners, Progress, RequestEvent};
use crate::http::{
    fold_headers, Headers, HttpMethod, Query, ResponseEncoding, SendFileAs, DEFAULT_TIMEOUT,
};
use crate::response::Response;
use crate::url::{append_query_object, append_query_param, interpolate_route_params, prepend_origin};

/// Query parameter that carries the client's API key.
pub const API_KEY_PARAM: &str = "api_key";

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Construction options of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    /// Path relative to the origin, possibly with `/:name` route parameters,
    /// or an absolute URL.
    pub path: String,
    /// Overrides the client's origin.
    pub origin: Option<String>,
    pub query: Query,
    pub params: Query,
    /// Caller headers in any case; folded to lowercase at construction.
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    /// JSON payload. A string value is sent verbatim.
    pub body: Option<Value>,
    pub file: Option<Bytes>,
    pub send_file_as: Option<SendFileAs>,
    pub encoding: Option<ResponseEncoding>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            origin: None,
            query: Query::new(),
            params: Query::new(),
            headers: Vec::new(),
            timeout: None,
            body: None,
            file: None,
            send_file_as: None,
            encoding: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn query(mut self, query: Query) -> Self {
        self.query = query;
        self
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn params(mut self, params: Query) -> Self {
        self.params = params;
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn file(mut self, file: impl Into<Bytes>, send_as: SendFileAs) -> Self {
        self.file = Some(file.into());
        self.send_file_as = Some(send_as);
        self
    }

    pub fn encoding(mut self, encoding: ResponseEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Shallow merge: every field set in `overrides` replaces the whole field.
    fn merged(&self, overrides: RequestOverrides) -> Self {
        let base = self.clone();
        Self {
            method: overrides.method.unwrap_or(base.method),
            path: overrides.path.unwrap_or(base.path),
            origin: overrides.origin.or(base.origin),
            query: overrides.query.unwrap_or(base.query),
            params: overrides.params.unwrap_or(base.params),
            headers: overrides.headers.unwrap_or(base.headers),
            timeout: overrides.timeout.or(base.timeout),
            body: overrides.body.or(base.body),
            file: overrides.file.or(base.file),
            send_file_as: overrides.send_file_as.or(base.send_file_as),
            encoding: overrides.encoding.or(base.encoding),
        }
    }
}

/// Fields to replace when deriving a request with [`Request::extend`].
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub method: Option<HttpMethod>,
    pub path: Option<String>,
    pub origin: Option<String>,
    pub query: Option<Query>,
    pub params: Option<Query>,
    pub headers: Option<Vec<(String, String)>>,
    pub timeout: Option<Duration>,
    pub body: Option<Value>,
    pub file: Option<Bytes>,
    pub send_file_as: Option<SendFileAs>,
    pub encoding: Option<ResponseEncoding>,
}

/// What a request was built from. Shared with its response so the response
/// can derive follow-up requests.
#[derive(Debug)]
pub(crate) struct Template {
    client: Client,
    options: RequestOptions,
}

#[derive(Default)]
struct State {
    aborted: bool,
    response: Option<Response>,
    error: Option<RequestError>,
    next_page: Option<Arc<Shared>>,
}

struct Shared {
    id: u64,
    template: Arc<Template>,
    origin: String,
    headers: Headers,
    timeout: Duration,
    encoding: ResponseEncoding,
    sent: AtomicBool,
    state: Mutex<State>,
    listeners: Listeners,
}

/// A single API call.
#[derive(Clone)]
pub struct Request {
    inner: Arc<Shared>,
}

impl Request {
    pub(crate) fn new(client: &Client, options: RequestOptions) -> Result<Self> {
        check_options(&options)?;
        let template = Template {
            client: client.clone(),
            options,
        };
        Ok(Self::build(Arc::new(template)))
    }

    /// A new request from `template` with `overrides` applied. The caller
    /// guarantees the merged path is not empty.
    pub(crate) fn from_template(template: &Template, overrides: RequestOverrides) -> Self {
        let options = template.options.merged(overrides);
        Self::build(Arc::new(Template {
            client: template.client.clone(),
            options,
        }))
    }

    fn build(template: Arc<Template>) -> Self {
        let options = &template.options;
        let mut defaults = Vec::new();
        if options.body.is_some() {
            defaults.push(("content-type".to_string(), "application/json".to_string()));
        }
        let headers = fold_headers(defaults.into_iter().chain(options.headers.iter().cloned()));
        let origin = options
            .origin
            .clone()
            .unwrap_or_else(|| template.client.origin().to_string());

        let shared = Shared {
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            origin,
            headers,
            timeout: options.timeout.unwrap_or(DEFAULT_TIMEOUT),
            encoding: options.encoding.unwrap_or_default(),
            template,
            sent: AtomicBool::new(false),
            state: Mutex::new(State::default()),
            listeners: Listeners::default(),
        };
        Self {
            inner: Arc::new(shared),
        }
    }

    /// Unique, increasing identifier within the process.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn client(&self) -> &Client {
        &self.inner.template.client
    }

    pub fn method(&self) -> HttpMethod {
        self.options().method
    }

    pub fn path(&self) -> &str {
        &self.options().path
    }

    pub fn origin(&self) -> &str {
        &self.inner.origin
    }

    pub fn query(&self) -> &Query {
        &self.options().query
    }

    pub fn params(&self) -> &Query {
        &self.options().params
    }

    /// Headers keyed by lowercased name.
    pub fn headers(&self) -> &Headers {
        &self.inner.headers
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn body(&self) -> Option<&Value> {
        self.options().body.as_ref()
    }

    pub fn file(&self) -> Option<&Bytes> {
        self.options().file.as_ref()
    }

    pub fn send_file_as(&self) -> Option<SendFileAs> {
        self.options().send_file_as
    }

    pub fn encoding(&self) -> ResponseEncoding {
        self.inner.encoding
    }

    pub fn is_sent(&self) -> bool {
        self.inner.sent.load(Ordering::SeqCst)
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.state.lock().aborted
    }

    /// The response, once the request succeeded.
    pub fn response(&self) -> Option<Response> {
        self.inner.state.lock().response.clone()
    }

    /// The failure, once the request failed.
    pub fn error(&self) -> Option<RequestError> {
        self.inner.state.lock().error.clone()
    }

    /// Full URL of the request.
    ///
    /// The API key is appended as `api_key` before route parameters are
    /// interpolated; `access_token` replaces the client's key, and an empty
    /// key leaves the parameter out.
    pub fn url(&self, access_token: Option<&str>) -> Result<String> {
        let url = prepend_origin(self.path(), Some(self.origin()));
        let mut url = append_query_object(&url, self.query());
        let token = access_token.unwrap_or_else(|| self.client().access_token());
        if !token.is_empty() {
            url = append_query_param(&url, API_KEY_PARAM, &Value::String(token.to_string()));
        }
        interpolate_route_params(&url, self.params())
    }

    /// Send the request through the client's transport.
    ///
    /// The request is marked as sent immediately. Sending it again fails with
    /// a usage error and does not reach the transport; use
    /// [`duplicate`](Self::duplicate) to repeat a call.
    pub fn send(&self) -> impl Future<Output = Result<Response>> + Send + 'static {
        let already_sent = self.inner.sent.swap(true, Ordering::SeqCst);
        let request = self.clone();
        async move {
            if already_sent {
                return Err(Error::Usage(
                    "This request has already been sent. Check the response and error properties. Create a new request with duplicate()."
                        .to_string(),
                ));
            }
            // Unresolvable route parameters fail before dispatch.
            request.url(None)?;
            debug!(id = request.id(), method = %request.method(), url = %request.redacted_url(), "sending request");

            let outcome = if request.is_aborted() {
                Err(RequestError::aborted(request.id()))
            } else {
                let transport = Arc::clone(request.client().transport());
                transport.send_request(&request).await
            };

            match outcome {
                Ok(response) => {
                    debug!(id = request.id(), status = response.status_code(), "request succeeded");
                    request.inner.state.lock().response = Some(response.clone());
                    request.inner.listeners.emit(&RequestEvent::Response(&response));
                    Ok(response)
                }
                Err(error) => {
                    debug!(id = request.id(), kind = %error.kind(), status = ?error.status_code(), "request failed");
                    request.inner.state.lock().error = Some(error.clone());
                    request.inner.listeners.emit(&RequestEvent::Error(&error));
                    Err(Error::Request(error))
                }
            }
        }
    }

    /// Abort the request.
    ///
    /// A pending `send()` resolves with an [`ErrorKind::Aborted`] error. A
    /// next-page request linked by pagination is aborted first and the link is
    /// cleared. Otherwise does nothing once the request has a response, an
    /// error, or was already aborted.
    ///
    /// [`ErrorKind::Aborted`]: crate::ErrorKind::Aborted
    pub fn abort(&self) {
        if let Some(next_page) = self.unlink_next_page() {
            next_page.abort();
        }

        {
            let mut state = self.inner.state.lock();
            if state.response.is_some() || state.error.is_some() || state.aborted {
                return;
            }
            state.aborted = true;
        }
        debug!(id = self.id(), "aborting request");
        self.client().transport().abort_request(self);
    }

    /// A fresh, unsent request with the same construction options.
    pub fn duplicate(&self) -> Request {
        Self::from_template(&self.inner.template, RequestOverrides::default())
    }

    /// A fresh, unsent request with the original options shallowly merged
    /// with `overrides`.
    pub fn extend(&self, overrides: RequestOverrides) -> Result<Request> {
        let options = self.options().merged(overrides);
        Request::new(self.client(), options)
    }

    /// Register a listener for one kind of notification.
    ///
    /// Listeners run synchronously on the task that settles the request,
    /// after the response or error has been stored and before `send()`
    /// resolves.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> &Self
    where
        F: Fn(&RequestEvent<'_>) + Send + Sync + 'static,
    {
        self.inner.listeners.add(kind, Arc::new(listener));
        self
    }

    /// Report download progress. Called by transports.
    pub fn notify_download_progress(&self, progress: Progress) {
        trace!(id = self.id(), transferred = progress.transferred, total = ?progress.total, "download progress");
        self.inner
            .listeners
            .emit(&RequestEvent::DownloadProgress(progress));
    }

    /// Report upload progress. Called by transports.
    pub fn notify_upload_progress(&self, progress: Progress) {
        self.inner
            .listeners
            .emit(&RequestEvent::UploadProgress(progress));
    }

    /// The URL without the API key, for logs.
    fn redacted_url(&self) -> String {
        self.url(Some(""))
            .unwrap_or_else(|_| self.path().to_string())
    }

    pub(crate) fn template(&self) -> Arc<Template> {
        Arc::clone(&self.inner.template)
    }

    pub(crate) fn link_next_page(&self, next: &Request) {
        self.inner.state.lock().next_page = Some(Arc::clone(&next.inner));
    }

    pub(crate) fn unlink_next_page(&self) -> Option<Request> {
        let inner = self.inner.state.lock().next_page.take()?;
        Some(Request { inner })
    }

    /// The page request most recently started by pagination from this
    /// request.
    pub fn linked_next_page(&self) -> Option<Request> {
        let inner = self.inner.state.lock().next_page.clone()?;
        Some(Request { inner })
    }

    fn options(&self) -> &RequestOptions {
        &self.inner.template.options
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id())
            .field("method", &self.method())
            .field("path", &self.path())
            .field("sent", &self.is_sent())
            .field("aborted", &self.is_aborted())
            .finish_non_exhaustive()
    }
}

fn check_options(options: &RequestOptions) -> Result<()> {
    if options.path.is_empty() {
        return Err(Error::Usage(
            "Request requires an options object with path and method properties".to_string(),
        ));
    }
    Ok(())
}
