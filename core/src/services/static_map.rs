//! Static route images.

use serde::Serialize;

use super::{route_type, validated_query, vehicle, ClientSource};
use crate::client::Client;
use crate::error::Result;
use crate::http::ResponseEncoding;
use crate::request::{Request, RequestOptions};
use crate::validator::{number, required, string, Shape};

/// Static map API service.
#[derive(Debug, Clone)]
pub struct StaticMap {
    client: Client,
}

impl StaticMap {
    pub fn new(source: impl Into<ClientSource>) -> Result<Self> {
        Ok(Self {
            client: source.into().into_client()?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// A PNG of the route between two points. The response body is
    /// [`ResponseBody::Binary`](crate::ResponseBody::Binary).
    ///
    /// See [`StaticRouteImage`](crate::types::StaticRouteImage).
    pub fn get_static_image<C>(&self, config: &C) -> Result<Request>
    where
        C: Serialize + ?Sized,
    {
        let shape = Shape::new()
            .field("origin", required(string()))
            .field("destination", required(string()))
            .field("width", number())
            .field("height", number())
            .field("vehicle", vehicle())
            .field("type", route_type())
            .field("color", string());
        let query = validated_query(config, shape)?;
        self.client.create_request(
            RequestOptions::get("/staticmap/route")
                .query(query)
                .encoding(ResponseEncoding::Binary),
        )
    }
}
