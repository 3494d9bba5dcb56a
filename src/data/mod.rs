//! Core data models for the Infobus transit client
//!
//! This module contains the entity types returned by the Infobus REST API
//! (regions, cities, routes, stations, buses and arrival predictions) together
//! with the API client and small helpers for working with them.
//!
//! Field names are semantic; the `#[serde(rename)]` attributes carry the wire
//! names so that the same types round-trip through the local store unchanged.

pub mod client;
pub mod polyline;
pub mod stops;

pub use client::{ApiError, ApiResult, TransitApi, TransitClient};
pub use polyline::{decode_path, Coordinate};
pub use stops::{ordered_route_stops, sort_predictions};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A top-level administrative area (usually a country) scoping city lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// Short city entry from `/countries/{id}/cities`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "serviceURL")]
    pub service_url: String,
}

/// Detailed city information from `/cities/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityDetail {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Initial map zoom level suggested by the service
    #[serde(rename = "mapZoom")]
    pub zoom: i32,
    #[serde(rename = "mapLayers")]
    pub map_layers: Vec<String>,
    /// Service announcement for the city
    pub message: String,
    /// Whether `message` should be shown to the user
    #[serde(rename = "displayMessage")]
    pub display_message: bool,
}

impl CityDetail {
    /// Returns the city center as a map coordinate
    pub fn center(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// A transit route from `/cities/{id}/routes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    #[serde(rename = "cityId")]
    pub city_id: i64,
    /// Route identifier in the upstream bus reporting system
    #[serde(rename = "busreportRouteId")]
    pub external_route_id: i64,
    #[serde(rename = "routeName")]
    pub name: String,
    /// Public route number shown to passengers (e.g. "12", "37A")
    #[serde(rename = "routeNumber")]
    pub number: String,
    /// Polyline as alternating longitude/latitude tokens
    #[serde(rename = "location")]
    pub path_encoding: String,
    #[serde(rename = "bussesOnRoute")]
    pub bus_count: i64,
}

impl Route {
    /// Decodes the route polyline into map coordinates
    pub fn path(&self) -> Vec<Coordinate> {
        decode_path(&self.path_encoding)
    }
}

/// A stop from `/cities/{id}/stations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "cityId")]
    pub city_id: i64,
    pub id: i64,
    pub name: String,
    pub description: String,
    pub lat: f64,
    pub lon: f64,
}

/// Join row between routes and stations from `/cities/{id}/routestations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStationLink {
    pub id: i64,
    #[serde(rename = "cityId")]
    pub city_id: i64,
    #[serde(rename = "routeId")]
    pub route_id: i64,
    #[serde(rename = "stationId")]
    pub station_id: i64,
    /// Position of the stop within the route and direction
    #[serde(rename = "sequenceNumber")]
    pub sequence: i64,
    #[serde(rename = "directionForward")]
    pub direction_forward: bool,
}

/// A stop of a single route from `/cities/{id}/routes/{routeId}/stations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStationDetail {
    pub id: i64,
    #[serde(rename = "routeId")]
    pub route_id: i64,
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    #[serde(rename = "sequenceNumber")]
    pub sequence: i64,
    #[serde(rename = "directionForward")]
    pub direction_forward: bool,
}

/// A live vehicle position from `/cities/{id}/routes/{routeId}/busses`
///
/// Buses are never cached; every read goes to the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: i64,
    #[serde(rename = "cityId")]
    pub city_id: i64,
    #[serde(rename = "busreportRouteId")]
    pub route_id: i64,
    pub imei: String,
    pub name: String,
    /// Heading in degrees
    pub direction: i32,
    /// Speed in km/h
    pub speed: i32,
    pub lat: f64,
    pub lon: f64,
    /// Whether the vehicle is adapted for passengers with reduced mobility
    #[serde(rename = "invalidAdapted")]
    pub accessible: bool,
    pub offline: bool,
    #[serde(rename = "filling", default)]
    pub filling_info: Option<Filling>,
}

/// Passenger load reported by a bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filling {
    pub capacity: i32,
    pub filling: i32,
    pub percentage: i32,
    #[serde(rename = "updated_at")]
    pub updated_at: String,
}

/// Keeps only accessible buses when `only_accessible` is set
pub fn visible_buses(buses: Vec<Bus>, only_accessible: bool) -> Vec<Bus> {
    if only_accessible {
        buses.into_iter().filter(|bus| bus.accessible).collect()
    } else {
        buses
    }
}

/// Arrival prediction from `/cities/{id}/stations/{stationId}/prediction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "avgSpeed")]
    pub avg_speed: i32,
    #[serde(rename = "busIMEI")]
    pub bus_imei: String,
    #[serde(rename = "distance")]
    pub distance_meters: i64,
    /// Unix time in milliseconds
    #[serde(rename = "generatedTime")]
    pub generated_at_ms: i64,
    #[serde(rename = "mainPrediction")]
    pub is_main_prediction: bool,
    /// Unix time in milliseconds
    #[serde(rename = "messageTime")]
    pub message_at_ms: i64,
    /// Seconds until arrival
    #[serde(rename = "prediction")]
    pub prediction_seconds: i64,
    #[serde(rename = "reverse")]
    pub is_reverse_direction: bool,
    #[serde(rename = "routeId")]
    pub route_id: i64,
    pub speed: i32,
    #[serde(rename = "stationId")]
    pub station_id: i64,
}

impl Prediction {
    /// When the prediction was generated, if the timestamp is representable
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.generated_at_ms)
    }

    /// When the bus last reported its position
    pub fn message_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.message_at_ms)
    }

    /// Expected arrival time relative to when the prediction was generated
    ///
    /// `None` when either timestamp falls outside the representable range.
    pub fn arrival_at(&self) -> Option<DateTime<Utc>> {
        let wait = TimeDelta::try_seconds(self.prediction_seconds)?;
        self.generated_at()?.checked_add_signed(wait)
    }
}
