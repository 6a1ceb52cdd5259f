//! Routing between an origin and one or more destinations.

use serde::Serialize;

use super::{route_type, stringify_booleans, validated_query, vehicle, ClientSource};
use crate::client::Client;
use crate::error::Result;
use crate::request::{Request, RequestOptions};
use crate::validator::{boolean, required, string, Shape};

/// Directions API service.
#[derive(Debug, Clone)]
pub struct Directions {
    client: Client,
}

impl Directions {
    pub fn new(source: impl Into<ClientSource>) -> Result<Self> {
        Ok(Self {
            client: source.into().into_client()?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// See [`DirectionsRequest`](crate::types::DirectionsRequest).
    pub fn get_directions<C>(&self, config: &C) -> Result<Request>
    where
        C: Serialize + ?Sized,
    {
        let shape = Shape::new()
            .field("origin", required(string()))
            .field("destination", required(string()))
            .field("vehicle", vehicle())
            .field("type", route_type())
            .field("alternatives", boolean());
        let query = stringify_booleans(validated_query(config, shape)?);
        self.client
            .create_request(RequestOptions::get("/Direction").query(query))
    }
}
