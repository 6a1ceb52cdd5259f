//! Place autocomplete and place details.
//!
//! Autocomplete calls made while a user types should share one session
//! token, ended by the place detail call for the chosen prediction.
//! [`Autocomplete::session_token`] mints one.

use serde::Serialize;
use uuid::Uuid;

use super::{stringify_booleans, validated_query, ClientSource};
use crate::client::Client;
use crate::error::Result;
use crate::request::{Request, RequestOptions};
use crate::validator::{boolean, number, required, string, Shape};

/// Place autocomplete API service.
#[derive(Debug, Clone)]
pub struct Autocomplete {
    client: Client,
}

impl Autocomplete {
    pub fn new(source: impl Into<ClientSource>) -> Result<Self> {
        Ok(Self {
            client: source.into().into_client()?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// A fresh session token.
    pub fn session_token() -> String {
        Uuid::new_v4().to_string()
    }

    /// Predictions for a partial `input`. The response is paginated.
    ///
    /// See [`AutocompleteSearch`](crate::types::AutocompleteSearch).
    pub fn search<C>(&self, config: &C) -> Result<Request>
    where
        C: Serialize + ?Sized,
    {
        let shape = Shape::new()
            .field("input", required(string()))
            .field("location", string())
            .field("radius", number())
            .field("limit", number())
            .field("sessiontoken", string())
            .field("more_compound", boolean());
        let query = stringify_booleans(validated_query(config, shape)?);
        self.client
            .create_request(RequestOptions::get("/place/autocomplete").query(query))
    }

    /// Details of a predicted place.
    ///
    /// See [`PlaceDetail`](crate::types::PlaceDetail).
    pub fn place_detail<C>(&self, config: &C) -> Result<Request>
    where
        C: Serialize + ?Sized,
    {
        let shape = Shape::new()
            .field("placeid", required(string()))
            .field("place_id", string())
            .field("sessiontoken", string());
        let query = validated_query(config, shape)?;
        self.client
            .create_request(RequestOptions::get("/place/detail").query(query))
    }
}
