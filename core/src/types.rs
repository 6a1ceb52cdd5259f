//! Typed configurations for the service operations.
//!
//! # Design
//! Services accept any `Serialize` value and validate the resulting JSON, so
//! these structs are a convenience, not a requirement. Optional fields are
//! skipped when unset so they never reach the query string. Field names are
//! the API's own query parameter names.

use serde::{Deserialize, Serialize};

/// Travel mode understood by routing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vehicle {
    Car,
    Bike,
    Taxi,
    /// Heavy duty.
    Hd,
}

impl Vehicle {
    pub const ALL: [&'static str; 4] = ["car", "bike", "taxi", "hd"];
}

/// Route optimisation criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Fastest,
    Shortest,
}

impl RouteType {
    pub const ALL: [&'static str; 2] = ["fastest", "shortest"];
}

/// `GET /place/autocomplete`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutocompleteSearch {
    pub input: String,
    /// `"lat,lng"` to bias results towards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Bias radius in kilometres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessiontoken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub more_compound: Option<bool>,
}

impl AutocompleteSearch {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }
}

/// `GET /place/detail`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceDetail {
    pub placeid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessiontoken: Option<String>,
}

/// `GET /Direction`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionsRequest {
    /// `"lat,lng"`.
    pub origin: String,
    /// One or more `"lat,lng"` waypoints separated by `;`.
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub route_type: Option<RouteType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<bool>,
}

/// `GET /Geocode` by coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseGeocode {
    /// `"lat,lng"`.
    pub latlng: String,
}

/// `GET /Geocode` by address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardGeocode {
    pub address: String,
}

/// `GET /Place/Detail`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodePlaceDetail {
    pub place_id: String,
}

/// `GET /DistanceMatrix`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceMatrixRequest {
    /// `"lat,lng"` points separated by `|`.
    pub origins: String,
    pub destinations: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub route_type: Option<RouteType>,
}

/// `GET /staticmap/route`. The response is a PNG image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticRouteImage {
    pub origin: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub route_type: Option<RouteType>,
    /// Route colour, e.g. `"#253494"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unset_fields_are_skipped() {
        let search = AutocompleteSearch::new("ha noi");
        assert_eq!(serde_json::to_value(&search).unwrap(), json!({ "input": "ha noi" }));
    }

    #[test]
    fn route_type_serializes_as_type() {
        let request = DirectionsRequest {
            origin: "21.0,105.8".to_string(),
            destination: "21.1,105.9".to_string(),
            vehicle: Some(Vehicle::Hd),
            route_type: Some(RouteType::Shortest),
            alternatives: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "origin": "21.0,105.8",
                "destination": "21.1,105.9",
                "vehicle": "hd",
                "type": "shortest"
            })
        );
    }

    #[test]
    fn enum_names_match_serialized_values() {
        for (vehicle, name) in [Vehicle::Car, Vehicle::Bike, Vehicle::Taxi, Vehicle::Hd]
            .into_iter()
            .zip(Vehicle::ALL)
        {
            assert_eq!(serde_json::to_value(vehicle).unwrap(), json!(name));
        }
        assert_eq!(serde_json::to_value(RouteType::Fastest).unwrap(), json!(RouteType::ALL[0]));
    }
}
