//! Travel distance and time between sets of points.

use serde::Serialize;

use super::{route_type, validated_query, vehicle, ClientSource};
use crate::client::Client;
use crate::error::Result;
use crate::request::{Request, RequestOptions};
use crate::validator::{required, string, Shape};

/// Distance matrix API service.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    client: Client,
}

impl DistanceMatrix {
    pub fn new(source: impl Into<ClientSource>) -> Result<Self> {
        Ok(Self {
            client: source.into().into_client()?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// See [`DistanceMatrixRequest`](crate::types::DistanceMatrixRequest).
    pub fn get_matrix<C>(&self, config: &C) -> Result<Request>
    where
        C: Serialize + ?Sized,
    {
        let shape = Shape::new()
            .field("origins", required(string()))
            .field("destinations", required(string()))
            .field("vehicle", vehicle())
            .field("type", route_type());
        let query = validated_query(config, shape)?;
        self.client
            .create_request(RequestOptions::get("/DistanceMatrix").query(query))
    }
}
