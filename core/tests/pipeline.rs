//! Request lifecycle and pagination against a scripted in-memory transport.
//!
//! # Design
//! `PagedTransport` answers `/items` with `{"page": n}` and a `Link` to page
//! `n + 1` until the last page, counting every call. Individual pages can be
//! made to fail or to hang until aborted, which is enough to observe
//! backpressure, abort cascading and notification ordering without a socket.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use goong_core::transport::settle;
use goong_core::{
    Client, ClientConfig, Error, ErrorKind, EventKind, Headers, InFlight, Request, RequestError,
    RequestEvent, RequestOptions, Response, Transport,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct PagedTransport {
    pages: u32,
    fail_page: Option<u32>,
    hold_page: Option<u32>,
    calls: AtomicUsize,
    aborts: AtomicUsize,
    in_flight: InFlight,
}

impl PagedTransport {
    fn new(pages: u32) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

fn page_of(path: &str) -> u32 {
    path.rsplit_once("page=")
        .and_then(|(_, n)| n.parse().ok())
        .unwrap_or(1)
}

#[async_trait]
impl Transport for PagedTransport {
    async fn send_request(&self, request: &Request) -> Result<Response, RequestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let page = page_of(request.path());
        self.in_flight
            .register(request)
            .run(request, async move {
                if self.hold_page == Some(page) {
                    std::future::pending::<()>().await;
                }
                if self.fail_page == Some(page) {
                    return settle(request, 500, Headers::new(), Bytes::from_static(br#"{"message":"boom"}"#));
                }
                let mut headers = Headers::new();
                if page < self.pages {
                    headers.insert(
                        "link".to_string(),
                        format!("<https://pages.test/items?page={}>; rel=\"next\"", page + 1),
                    );
                }
                settle(request, 200, headers, Bytes::from(format!("{{\"page\":{page}}}")))
            })
            .await
    }

    fn abort_request(&self, request: &Request) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        self.in_flight.cancel(request.id());
    }
}

fn setup(transport: PagedTransport) -> (Arc<PagedTransport>, Request) {
    common::init_tracing();
    let transport = Arc::new(transport);
    let client = Client::builder()
        .config(ClientConfig::new("test-key"))
        .shared_transport(transport.clone())
        .build()
        .unwrap();
    let request = client.create_request(RequestOptions::get("/items")).unwrap();
    (transport, request)
}

fn page_number(response: &Response) -> u64 {
    response.json::<Value>().unwrap()["page"].as_u64().unwrap()
}

type Delivered = (Result<u64, ErrorKind>, goong_core::Advance);

/// Run `each_page` on a task, forwarding every callback to a channel.
fn walk(request: &Request) -> (tokio::task::JoinHandle<()>, mpsc::UnboundedReceiver<Delivered>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let request = request.clone();
    let handle = tokio::spawn(async move {
        request
            .each_page(move |page, advance| {
                let page = match page {
                    Ok(response) => Ok(page_number(response)),
                    Err(Error::Request(err)) => Err(err.kind()),
                    Err(other) => panic!("unexpected error: {other}"),
                };
                tx.send((page, advance)).unwrap();
            })
            .await
    });
    (handle, rx)
}

async fn settle_tasks() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn each_page_fetches_only_after_advance() {
    let (transport, request) = setup(PagedTransport::new(3));
    let (handle, mut rx) = walk(&request);

    for expected in 1..=3u64 {
        let (page, advance) = rx.recv().await.unwrap();
        assert_eq!(page, Ok(expected));
        settle_tasks().await;
        assert_eq!(transport.calls(), expected as usize);
        advance.next();
    }

    handle.await.unwrap();
    assert!(rx.recv().await.is_none());
    assert_eq!(transport.calls(), 3);
    assert!(transport.in_flight.is_empty());
}

#[tokio::test]
async fn dropping_advance_stops_the_walk() {
    let (transport, request) = setup(PagedTransport::new(3));
    let (handle, mut rx) = walk(&request);

    let (page, advance) = rx.recv().await.unwrap();
    assert_eq!(page, Ok(1));
    drop(advance);

    handle.await.unwrap();
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn failing_page_ends_the_walk_with_an_error() {
    let (transport, request) = setup(PagedTransport {
        fail_page: Some(2),
        ..PagedTransport::new(3)
    });
    let (handle, mut rx) = walk(&request);

    let (page, advance) = rx.recv().await.unwrap();
    assert_eq!(page, Ok(1));
    advance.next();

    let (page, advance) = rx.recv().await.unwrap();
    assert_eq!(page, Err(ErrorKind::Http));
    advance.next();

    handle.await.unwrap();
    assert!(rx.recv().await.is_none());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn aborting_the_first_request_aborts_the_page_in_flight() {
    let (transport, request) = setup(PagedTransport {
        hold_page: Some(2),
        ..PagedTransport::new(3)
    });
    let (handle, mut rx) = walk(&request);

    let (_, advance) = rx.recv().await.unwrap();
    advance.next();
    while transport.in_flight.is_empty() {
        settle_tasks().await;
    }
    let linked = request.linked_next_page().unwrap();

    request.abort();
    let (page, _) = rx.recv().await.unwrap();
    assert_eq!(page, Err(ErrorKind::Aborted));
    handle.await.unwrap();

    // The first request already had its response.
    assert!(!request.is_aborted());
    assert!(request.response().is_some());
    assert!(request.linked_next_page().is_none());
    assert!(linked.is_aborted());
    assert!(linked.error().is_some_and(|err| err.is_aborted()));
    assert_eq!(transport.aborts(), 1);
    assert!(transport.in_flight.is_empty());
}

#[tokio::test]
async fn abort_after_response_changes_nothing() {
    let (transport, request) = setup(PagedTransport::new(1));
    let response = request.send().await.unwrap();

    request.abort();

    assert!(!request.is_aborted());
    assert!(request.error().is_none());
    assert_eq!(request.response().map(|stored| page_number(&stored)), Some(page_number(&response)));
    assert_eq!(transport.aborts(), 0);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn each_page_clears_the_link_after_the_last_page() {
    let (_transport, request) = setup(PagedTransport::new(2));
    let (handle, mut rx) = walk(&request);

    let (_, advance) = rx.recv().await.unwrap();
    advance.next();
    let (page, advance) = rx.recv().await.unwrap();
    assert_eq!(page, Ok(2));
    assert!(request.linked_next_page().is_some());
    advance.next();

    handle.await.unwrap();
    assert!(request.linked_next_page().is_none());
}

#[tokio::test]
async fn page_stream_collects_every_page() {
    let (transport, request) = setup(PagedTransport::new(3));
    let pages = request.pages().collect().await.unwrap();
    let numbers: Vec<u64> = pages.iter().map(page_number).collect();
    assert_eq!(numbers, [1, 2, 3]);
    assert_eq!(transport.calls(), 3);
    assert!(!pages[2].has_next_page());
}

#[tokio::test]
async fn response_next_page_is_an_unsent_copy() {
    let (transport, request) = setup(PagedTransport::new(2));
    let first = request.send().await.unwrap();
    let next = first.next_page().unwrap();
    assert!(!next.is_sent());
    assert_eq!(next.path(), "https://pages.test/items?page=2");

    let second = next.send().await.unwrap();
    assert_eq!(page_number(&second), 2);
    assert!(second.next_page().is_none());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn second_send_never_reaches_the_transport() {
    let (transport, request) = setup(PagedTransport::new(1));
    request.send().await.unwrap();
    let err = request.send().await.unwrap_err();
    assert!(matches!(err, Error::Usage(_)));
    assert_eq!(transport.calls(), 1);

    let again = request.duplicate().send().await.unwrap();
    assert_eq!(page_number(&again), 1);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn abort_while_pending_resolves_aborted_once() {
    let (transport, request) = setup(PagedTransport {
        hold_page: Some(1),
        ..PagedTransport::new(1)
    });
    let errors = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&errors);
    request.on(EventKind::Error, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let pending = tokio::spawn(request.send());
    while transport.in_flight.is_empty() {
        settle_tasks().await;
    }
    request.abort();
    request.abort();

    let err = pending.await.unwrap().unwrap_err();
    let err = err.as_request_error().unwrap();
    assert_eq!(err.kind(), ErrorKind::Aborted);
    assert_eq!(err.message(), Some("Request aborted"));
    assert_eq!(err.request_id(), request.id());
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert!(request.response().is_none());
}

#[tokio::test]
async fn listeners_run_before_send_resolves() {
    let (_transport, request) = setup(PagedTransport::new(1));
    let log = Arc::new(Mutex::new(Vec::new()));

    let first = Arc::clone(&log);
    request.on(EventKind::Response, move |event| {
        if let RequestEvent::Response(response) = event {
            first.lock().push(format!("response {}", response.status_code()));
        }
    });
    let second = Arc::clone(&log);
    request.on(EventKind::Response, move |_| second.lock().push("second".to_string()));
    let errors = Arc::clone(&log);
    request.on(EventKind::Error, move |_| errors.lock().push("error".to_string()));

    request.send().await.unwrap();
    log.lock().push("resolved".to_string());

    assert_eq!(*log.lock(), ["response 200", "second", "resolved"]);
}
