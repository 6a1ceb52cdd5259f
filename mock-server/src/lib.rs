//! In-process stand-in for the Goong REST API.
//!
//! Serves canned, deterministic data on the same paths as the real API so
//! the client can be exercised end to end without network access:
//!
//! - every route requires a non-empty `api_key` query parameter (401
//!   otherwise);
//! - `/place/autocomplete` is paginated over three pages through `Link`
//!   headers;
//! - `/place/detail?placeid=missing` answers 404 with a JSON message;
//! - `/staticmap/route` answers a PNG;
//! - `/slow` answers after five seconds, for abort and timeout tests.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Query, Request},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Number of pages served by `/place/autocomplete`.
pub const AUTOCOMPLETE_PAGES: u32 = 3;

/// How long `/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(5);

/// PNG signature that starts every `/staticmap/route` body.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Size of the `/staticmap/route` body.
pub const STATIC_MAP_LEN: usize = 64 * 1024;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub place_id: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AutocompletePage {
    pub predictions: Vec<Prediction>,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub place_id: String,
    pub name: String,
    pub formatted_address: String,
    pub location: Location,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlaceResult {
    pub result: Place,
    pub status: String,
}

#[derive(Deserialize)]
struct AutocompleteParams {
    input: Option<String>,
    page: Option<u32>,
}

#[derive(Deserialize)]
struct PlaceDetailParams {
    placeid: Option<String>,
}

#[derive(Deserialize)]
struct GeocodePlaceParams {
    place_id: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeParams {
    latlng: Option<String>,
    address: Option<String>,
}

#[derive(Deserialize)]
struct RouteParams {
    origin: Option<String>,
    destination: Option<String>,
    vehicle: Option<String>,
    alternatives: Option<String>,
}

#[derive(Deserialize)]
struct MatrixParams {
    origins: Option<String>,
    destinations: Option<String>,
}

pub fn app() -> Router {
    Router::new()
        .route("/place/autocomplete", get(autocomplete))
        .route("/place/detail", get(place_detail))
        .route("/Place/Detail", get(geocode_place_detail))
        .route("/Geocode", get(geocode))
        .route("/Direction", get(directions))
        .route("/DistanceMatrix", get(distance_matrix))
        .route("/staticmap/route", get(static_route))
        .route("/slow", get(slow))
        .route("/echo", post(echo))
        .layer(middleware::from_fn(require_api_key))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Deterministic place id for a name.
pub fn place_id(name: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn has_api_key(query: Option<&str>) -> bool {
    query.is_some_and(|query| {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .any(|(key, value)| key == "api_key" && !value.is_empty())
    })
}

async fn require_api_key(request: Request, next: Next) -> Response {
    if !has_api_key(request.uri().query()) {
        return error(StatusCode::UNAUTHORIZED, "api_key is required");
    }
    next.run(request).await
}

fn place(name: &str) -> Place {
    Place {
        place_id: place_id(name),
        name: name.to_string(),
        formatted_address: format!("{name}, Ha Noi"),
        location: Location {
            lat: 21.0278,
            lng: 105.8342,
        },
    }
}

async fn autocomplete(headers: HeaderMap, Query(params): Query<AutocompleteParams>) -> Response {
    let Some(input) = params.input.filter(|input| !input.is_empty()) else {
        return error(StatusCode::BAD_REQUEST, "input is required");
    };
    let page = params.page.unwrap_or(1);
    if page == 0 || page > AUTOCOMPLETE_PAGES {
        return error(StatusCode::NOT_FOUND, "page out of range");
    }

    let predictions = (1..=2)
        .map(|n| {
            let description = format!("{input} {page}.{n}");
            Prediction {
                place_id: place_id(&description),
                description,
            }
        })
        .collect();
    let body = Json(AutocompletePage {
        predictions,
        status: "OK".to_string(),
    });

    if page == AUTOCOMPLETE_PAGES {
        return body.into_response();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .unwrap_or("localhost");
    let link = format!(
        "<http://{host}/place/autocomplete?page={next}>; rel=\"next\"",
        next = page + 1
    );
    ([(header::LINK, link)], body).into_response()
}

async fn place_detail(Query(params): Query<PlaceDetailParams>) -> Response {
    match params.placeid.as_deref() {
        None | Some("") => error(StatusCode::BAD_REQUEST, "placeid is required"),
        Some("missing") => error(StatusCode::NOT_FOUND, "not found"),
        Some(id) => Json(PlaceResult {
            result: Place {
                place_id: id.to_string(),
                ..place("Ho Guom")
            },
            status: "OK".to_string(),
        })
        .into_response(),
    }
}

async fn geocode_place_detail(Query(params): Query<GeocodePlaceParams>) -> Response {
    match params.place_id.as_deref() {
        None | Some("") => error(StatusCode::BAD_REQUEST, "place_id is required"),
        Some("missing") => error(StatusCode::NOT_FOUND, "not found"),
        Some(id) => Json(PlaceResult {
            result: Place {
                place_id: id.to_string(),
                ..place("Van Mieu")
            },
            status: "OK".to_string(),
        })
        .into_response(),
    }
}

async fn geocode(Query(params): Query<GeocodeParams>) -> Response {
    let name = match (params.latlng, params.address) {
        (Some(latlng), _) => format!("Near {latlng}"),
        (None, Some(address)) => address,
        (None, None) => return error(StatusCode::BAD_REQUEST, "latlng or address is required"),
    };
    Json(json!({ "results": [place(&name)], "status": "OK" })).into_response()
}

async fn directions(Query(params): Query<RouteParams>) -> Response {
    let (Some(origin), Some(destination)) = (params.origin, params.destination) else {
        return error(StatusCode::BAD_REQUEST, "origin and destination are required");
    };
    let routes = if params.alternatives.as_deref() == Some("true") { 2 } else { 1 };
    let routes: Vec<Value> = (0..routes)
        .map(|n| {
            json!({
                "summary": format!("{origin} to {destination}"),
                "vehicle": params.vehicle.clone().unwrap_or_else(|| "car".to_string()),
                "legs": [{
                    "distance": { "text": "5 km", "value": 5000 + n * 500 },
                    "duration": { "text": "12 mins", "value": 720 + n * 60 }
                }]
            })
        })
        .collect();
    Json(json!({ "routes": routes, "status": "OK" })).into_response()
}

async fn distance_matrix(Query(params): Query<MatrixParams>) -> Response {
    let (Some(origins), Some(destinations)) = (params.origins, params.destinations) else {
        return error(StatusCode::BAD_REQUEST, "origins and destinations are required");
    };
    let columns = destinations.split('|').count();
    let rows: Vec<Value> = origins
        .split('|')
        .map(|_| {
            let elements: Vec<Value> = (0..columns)
                .map(|n| {
                    json!({
                        "distance": { "value": 1000 * (n + 1) },
                        "duration": { "value": 120 * (n + 1) },
                        "status": "OK"
                    })
                })
                .collect();
            json!({ "elements": elements })
        })
        .collect();
    Json(json!({ "rows": rows })).into_response()
}

/// A PNG signature followed by filler bytes.
pub fn static_map_png() -> Vec<u8> {
    let mut png = PNG_SIGNATURE.to_vec();
    png.extend((0..STATIC_MAP_LEN - PNG_SIGNATURE.len()).map(|i| (i % 251) as u8));
    png
}

async fn static_route() -> Response {
    ([(header::CONTENT_TYPE, "image/png")], static_map_png()).into_response()
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(SLOW_DELAY).await;
    Json(json!({}))
}

async fn echo(headers: HeaderMap, body: Bytes) -> Json<Value> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    Json(json!({
        "length": body.len(),
        "content_type": content_type,
        "body": String::from_utf8_lossy(&body),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_ids_are_stable() {
        assert_eq!(place_id("Ho Guom"), place_id("Ho Guom"));
        assert_ne!(place_id("Ho Guom"), place_id("Van Mieu"));
    }

    #[test]
    fn api_key_must_be_present_and_non_empty() {
        assert!(has_api_key(Some("input=x&api_key=k")));
        assert!(!has_api_key(Some("input=x&api_key=")));
        assert!(!has_api_key(Some("input=x")));
        assert!(!has_api_key(None));
    }

    #[test]
    fn static_map_starts_with_png_signature() {
        let png = static_map_png();
        assert_eq!(png.len(), STATIC_MAP_LEN);
        assert_eq!(png[..8], PNG_SIGNATURE);
    }

    #[test]
    fn prediction_roundtrips_through_json() {
        let page = AutocompletePage {
            predictions: vec![Prediction {
                place_id: place_id("a"),
                description: "a".to_string(),
            }],
            status: "OK".to_string(),
        };
        let json = serde_json::to_string(&page).unwrap();
        let back: AutocompletePage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, page);
    }
}
