//! Client for the Goong maps REST API.
//!
//! # Overview
//! A [`Client`] holds the API key, the origin and a [`Transport`]. Services
//! ([`Geocoding`], [`Directions`], ...) validate a configuration and return
//! an unsent [`Request`]. Sending resolves to a [`Response`] or an
//! [`Error`]; paginated responses link to the next page, which is fetched
//! only when the caller asks for it.
//!
//! ```no_run
//! # async fn run() -> goong_core::Result<()> {
//! use goong_core::{ClientConfig, Goong};
//! use goong_core::types::ReverseGeocode;
//!
//! let goong = Goong::new(ClientConfig::new("my-api-key"))?;
//! let request = goong.geocoding.reverse_geocode(&ReverseGeocode {
//!     latlng: "21.0137,105.7982".to_string(),
//! })?;
//! let response = request.send().await?;
//! println!("{:?}", response.body());
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - Validation and URL building are pure and synchronous; only `send()`
//!   touches the network.
//! - A request is sent at most once. Repeating a call means
//!   [`Request::duplicate`] or [`Request::extend`].
//! - Transports are swappable behind one trait. The `reqwest-transport`
//!   feature (default) provides an async transport, `ureq-transport` a
//!   blocking one.

pub mod client;
pub mod error;
pub mod events;
pub mod http;
pub mod links;
pub mod pagination;
pub mod request;
pub mod response;
pub mod services;
pub mod transport;
pub mod types;
pub mod url;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{Client, ClientBuilder, ClientConfig, API_ORIGIN};
pub use error::{Error, ErrorKind, RequestError, Result};
pub use events::{EventKind, Progress, RequestEvent};
pub use http::{Headers, HttpMethod, Query, ResponseEncoding, SendFileAs};
pub use links::{parse_link_header, Link, Links};
pub use pagination::{Advance, PageStream};
pub use request::{Request, RequestOptions, RequestOverrides};
pub use response::{Response, ResponseBody};
pub use services::{
    Autocomplete, ClientSource, Directions, DistanceMatrix, Geocoding, Goong, StaticMap,
};
pub use transport::{InFlight, Transport};
#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
#[cfg(feature = "ureq-transport")]
pub use transport::UreqTransport;
pub use validator::ValidationError;
