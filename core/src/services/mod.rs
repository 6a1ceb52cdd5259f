//! Service factories for the Goong REST endpoints.
//!
//! # Design
//! Every operation follows the same three steps: serialize the caller's
//! configuration to JSON, assert it against a strict shape, and hand it to
//! [`Client::create_request`] as the query. Nothing is sent; the caller gets
//! an unsent [`Request`](crate::Request) back.

use serde::Serialize;
use serde_json::Value;

use crate::client::{Client, ClientConfig};
use crate::error::{Error, Result};
use crate::http::Query;
use crate::types::{RouteType, Vehicle};
use crate::validator::{assert_shape, one_of, Shape, Validator};

mod autocomplete;
mod directions;
mod distance_matrix;
mod geocoding;
mod static_map;

pub use autocomplete::Autocomplete;
pub use directions::Directions;
pub use distance_matrix::DistanceMatrix;
pub use geocoding::Geocoding;
pub use static_map::StaticMap;

/// What a service is built from: an existing client, or the configuration
/// for a new one.
#[derive(Debug, Clone)]
pub enum ClientSource {
    Client(Client),
    Config(ClientConfig),
}

impl ClientSource {
    pub fn into_client(self) -> Result<Client> {
        match self {
            ClientSource::Client(client) => Ok(client),
            ClientSource::Config(config) => Client::new(config),
        }
    }
}

impl From<Client> for ClientSource {
    fn from(client: Client) -> Self {
        ClientSource::Client(client)
    }
}

impl From<&Client> for ClientSource {
    fn from(client: &Client) -> Self {
        ClientSource::Client(client.clone())
    }
}

impl From<ClientConfig> for ClientSource {
    fn from(config: ClientConfig) -> Self {
        ClientSource::Config(config)
    }
}

/// One client shared by every service.
#[derive(Debug, Clone)]
pub struct Goong {
    pub autocomplete: Autocomplete,
    pub directions: Directions,
    pub distance_matrix: DistanceMatrix,
    pub geocoding: Geocoding,
    pub static_map: StaticMap,
}

impl Goong {
    pub fn new(source: impl Into<ClientSource>) -> Result<Self> {
        let client = source.into().into_client()?;
        Ok(Self {
            autocomplete: Autocomplete::new(&client)?,
            directions: Directions::new(&client)?,
            distance_matrix: DistanceMatrix::new(&client)?,
            geocoding: Geocoding::new(&client)?,
            static_map: StaticMap::new(&client)?,
        })
    }

    pub fn client(&self) -> &Client {
        self.geocoding.client()
    }
}

/// Serialize `config` and assert it against `shape`.
pub(crate) fn validated_query<C>(config: &C, shape: Shape) -> Result<Query>
where
    C: Serialize + ?Sized,
{
    let value = serde_json::to_value(config)?;
    assert_shape(shape)(&value)?;
    match value {
        Value::Object(query) => Ok(query),
        _ => Err(Error::Usage("service configuration must be an object".to_string())),
    }
}

/// Replace boolean values with `"true"` / `"false"` so they survive as
/// explicit query values.
pub fn stringify_booleans(query: Query) -> Query {
    query
        .into_iter()
        .map(|(key, value)| match value {
            Value::Bool(flag) => (key, Value::String(flag.to_string())),
            other => (key, other),
        })
        .collect()
}

pub(crate) fn vehicle() -> Validator {
    one_of(Vehicle::ALL)
}

pub(crate) fn route_type() -> Validator {
    one_of(RouteType::ALL)
}
