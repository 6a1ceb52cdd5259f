//! End-to-end tests of the async transport against the mock server.

#![cfg(feature = "reqwest-transport")]

mod common;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use goong_core::types::{AutocompleteSearch, PlaceDetail, ReverseGeocode, StaticRouteImage};
use goong_core::{
    ErrorKind, EventKind, Goong, HttpMethod, RequestEvent, RequestOptions, ReqwestTransport,
    ResponseBody, SendFileAs,
};
use serde_json::{json, Value};

fn goong(origin: &str) -> (Arc<ReqwestTransport>, Goong) {
    common::init_tracing();
    let transport = Arc::new(ReqwestTransport::new());
    let client = common::client_with(origin, transport.clone());
    (transport, Goong::new(client).unwrap())
}

#[tokio::test]
async fn reverse_geocode_round_trip() {
    let origin = common::spawn_server();
    let (transport, goong) = goong(&origin);

    let request = goong
        .geocoding
        .reverse_geocode(&ReverseGeocode {
            latlng: "21.0137,105.7982".to_string(),
        })
        .unwrap();
    let response = request.send().await.unwrap();

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.request_id(), request.id());
    assert_eq!(response.header("Content-Type"), Some("application/json"));
    let body = response.body().as_json().unwrap();
    assert_eq!(body["results"][0]["name"], "Near 21.0137,105.7982");
    assert!(request.response().is_some());
    assert!(transport.in_flight().is_empty());
}

#[tokio::test]
async fn http_error_is_normalized() {
    let origin = common::spawn_server();
    let (_, goong) = goong(&origin);

    let request = goong
        .autocomplete
        .place_detail(&PlaceDetail {
            placeid: "missing".to_string(),
            sessiontoken: None,
        })
        .unwrap();
    let err = request.send().await.unwrap_err();
    let err = err.as_request_error().unwrap();

    assert_eq!(err.kind(), ErrorKind::Http);
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.message(), Some("not found"));
    assert_eq!(err.body().and_then(ResponseBody::as_json), Some(&json!({ "message": "not found" })));
    assert_eq!(request.error().as_ref(), Some(err));
}

#[tokio::test]
async fn autocomplete_pages_follow_link_headers() {
    let origin = common::spawn_server();
    let (_, goong) = goong(&origin);

    let request = goong
        .autocomplete
        .search(&AutocompleteSearch::new("ho"))
        .unwrap();

    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let pages = Arc::clone(&seen);
    request
        .each_page(move |page, advance| {
            let response = page.unwrap();
            let body = response.body().as_json().unwrap();
            pages
                .lock()
                .push(body["predictions"][0]["description"].as_str().unwrap().to_string());
            advance.next();
        })
        .await;

    assert_eq!(*seen.lock(), ["ho 1.1", "ho 2.1", "ho 3.1"]);
    assert!(request.linked_next_page().is_none());
}

#[tokio::test]
async fn static_map_is_binary_with_download_progress() {
    let origin = common::spawn_server();
    let (_, goong) = goong(&origin);

    let request = goong
        .static_map
        .get_static_image(&StaticRouteImage {
            origin: "20.98,105.79".to_string(),
            destination: "21.03,105.85".to_string(),
            ..StaticRouteImage::default()
        })
        .unwrap();
    let received = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&received);
    request.on(EventKind::DownloadProgress, move |event| {
        if let RequestEvent::DownloadProgress(progress) = event {
            counter.store(progress.transferred, Ordering::SeqCst);
        }
    });

    let response = request.send().await.unwrap();
    let png = response.body().as_bytes().unwrap();
    assert_eq!(png.len(), mock_server::STATIC_MAP_LEN);
    assert_eq!(png[..8], mock_server::PNG_SIGNATURE);
    assert_eq!(received.load(Ordering::SeqCst), mock_server::STATIC_MAP_LEN as u64);
}

#[tokio::test]
async fn abort_ends_a_slow_request() {
    let origin = common::spawn_server();
    let (transport, goong) = goong(&origin);

    let request = goong
        .geocoding
        .client()
        .create_request(RequestOptions::get("/slow").timeout(Duration::from_secs(30)))
        .unwrap();
    let pending = tokio::spawn(request.send());
    while transport.in_flight().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    request.abort();
    let err = tokio::time::timeout(Duration::from_secs(2), pending)
        .await
        .expect("abort resolves promptly")
        .unwrap()
        .unwrap_err();
    assert!(err.as_request_error().is_some_and(|err| err.is_aborted()));
    assert!(transport.in_flight().is_empty());
}

#[tokio::test]
async fn default_timeout_is_a_transport_error() {
    let origin = common::spawn_server();
    let (_, goong) = goong(&origin);

    let request = goong
        .geocoding
        .client()
        .create_request(RequestOptions::get("/slow"))
        .unwrap();
    let err = request.send().await.unwrap_err();
    let err = err.as_request_error().unwrap();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.message(), Some("request timed out"));
}

#[tokio::test]
async fn json_body_is_posted_with_content_type() {
    let origin = common::spawn_server();
    let (_, goong) = goong(&origin);

    let request = goong
        .geocoding
        .client()
        .create_request(RequestOptions::new(HttpMethod::Post, "/echo").body(json!({ "a": 1 })))
        .unwrap();
    let echoed: Value = request.send().await.unwrap().json().unwrap();
    assert_eq!(echoed["content_type"], "application/json");
    assert_eq!(echoed["body"], r#"{"a":1}"#);
}

#[tokio::test]
async fn form_upload_reports_progress() {
    let origin = common::spawn_server();
    let (_, goong) = goong(&origin);

    let request = goong
        .geocoding
        .client()
        .create_request(
            RequestOptions::new(HttpMethod::Post, "/echo")
                .file(Bytes::from_static(b"route.gpx contents"), SendFileAs::Form),
        )
        .unwrap();
    let uploads = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&uploads);
    request.on(EventKind::UploadProgress, move |event| {
        if let RequestEvent::UploadProgress(progress) = event {
            assert_eq!(progress.percent, Some(100.0));
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    let echoed: Value = request.send().await.unwrap().json().unwrap();
    assert!(echoed["content_type"]
        .as_str()
        .unwrap()
        .starts_with("multipart/form-data"));
    assert!(echoed["body"].as_str().unwrap().contains("route.gpx contents"));
    assert_eq!(uploads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn config_source_uses_the_default_transport() {
    let origin = common::spawn_server();
    let goong = Goong::new(common::config(&origin)).unwrap();
    let response = goong
        .geocoding
        .forward_geocode(&json!({ "address": "Trung Kinh" }))
        .unwrap()
        .send()
        .await
        .unwrap();
    assert_eq!(response.body().as_json().unwrap()["results"][0]["name"], "Trung Kinh");
}
