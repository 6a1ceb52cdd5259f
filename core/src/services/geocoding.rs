//! Forward and reverse geocoding.

use serde::Serialize;

use super::{validated_query, ClientSource};
use crate::client::Client;
use crate::error::Result;
use crate::request::{Request, RequestOptions};
use crate::validator::{required, string, Shape};

/// Geocoding API service.
#[derive(Debug, Clone)]
pub struct Geocoding {
    client: Client,
}

impl Geocoding {
    pub fn new(source: impl Into<ClientSource>) -> Result<Self> {
        Ok(Self {
            client: source.into().into_client()?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Addresses at a `latlng` coordinate pair.
    ///
    /// See [`ReverseGeocode`](crate::types::ReverseGeocode).
    pub fn reverse_geocode<C>(&self, config: &C) -> Result<Request>
    where
        C: Serialize + ?Sized,
    {
        let query = validated_query(config, Shape::new().field("latlng", required(string())))?;
        self.client
            .create_request(RequestOptions::get("/Geocode").query(query))
    }

    /// Coordinates of an `address`.
    ///
    /// See [`ForwardGeocode`](crate::types::ForwardGeocode).
    pub fn forward_geocode<C>(&self, config: &C) -> Result<Request>
    where
        C: Serialize + ?Sized,
    {
        let query = validated_query(config, Shape::new().field("address", required(string())))?;
        self.client
            .create_request(RequestOptions::get("/Geocode").query(query))
    }

    /// Details of a place returned by a geocoding result.
    ///
    /// See [`GeocodePlaceDetail`](crate::types::GeocodePlaceDetail).
    pub fn place_detail<C>(&self, config: &C) -> Result<Request>
    where
        C: Serialize + ?Sized,
    {
        let query = validated_query(config, Shape::new().field("place_id", required(string())))?;
        self.client
            .create_request(RequestOptions::get("/Place/Detail").query(query))
    }
}
