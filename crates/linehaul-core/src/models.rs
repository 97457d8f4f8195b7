//! Core data models for the route-analysis subsystem.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A geographic coordinate in decimal degrees.
///
/// Valid values are -90..=90 latitude and -180..=180 longitude; the math
/// helpers do not re-validate, callers supply numeric coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A diesel station discovered near the route.
///
/// Request-scoped value object: stations are rebuilt on every discovery
/// call and never persisted. Identity is `id` (provider identifier).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelStation {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Reported diesel price in $/gal; absent when the provider has none.
    #[serde(default)]
    pub diesel_price: Option<f64>,
    /// Distance in miles from the route sample (or from the driver once a
    /// driver position is known).
    #[serde(default)]
    pub distance_from_route: Option<f64>,
    /// Route progress of the sample that discovered this station.
    #[serde(default)]
    pub miles_along_route: Option<f64>,
}

/// Urgency tier for a fuel-stop suggestion.
///
/// Ranks safety risk first, cost savings second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    /// Fuel level critically low; stop at the nearest station.
    High,
    /// Worthwhile savings within reach.
    Medium,
    /// Cheapest option along the route, no pressure.
    Low,
}

/// A ranked fuel-stop suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelSuggestion {
    pub station: FuelStation,
    pub urgency: Urgency,
    pub reason: String,
    /// $/gal saved versus the route average, when the station is priced.
    #[serde(default)]
    pub estimated_savings: Option<f64>,
}

/// Toll cost estimate from the toll collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TollEstimate {
    pub total_cost: f64,
    pub currency: String,
    pub toll_count: u32,
}

/// Complete fuel plan for one load's route.
///
/// Ephemeral: recomputed on each request, no stored lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteFuelPlan {
    pub load_id: String,
    /// Priced stations along the route, cheapest first.
    pub stations: Vec<FuelStation>,
    /// Top suggestions (at most 3).
    pub suggestions: Vec<FuelSuggestion>,
    pub average_diesel_price: f64,
    pub cheapest_diesel_price: f64,
    pub estimated_total_fuel_cost: f64,
    #[serde(default)]
    pub toll_estimate: Option<TollEstimate>,
}

/// A point emitted by the route sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub lat: f64,
    pub lng: f64,
    pub miles_from_start: f64,
}

/// Lifecycle status of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    Assigned,
    EnRoutePickup,
    AtPickup,
    Loaded,
    EnRouteDelivery,
    AtDelivery,
    Delivered,
}

impl LoadStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [LoadStatus; 7] = [
        LoadStatus::Assigned,
        LoadStatus::EnRoutePickup,
        LoadStatus::AtPickup,
        LoadStatus::Loaded,
        LoadStatus::EnRouteDelivery,
        LoadStatus::AtDelivery,
        LoadStatus::Delivered,
    ];

    /// Database/wire representation, matching the TMS status values.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Assigned => "ASSIGNED",
            LoadStatus::EnRoutePickup => "EN_ROUTE_PICKUP",
            LoadStatus::AtPickup => "AT_PICKUP",
            LoadStatus::Loaded => "LOADED",
            LoadStatus::EnRouteDelivery => "EN_ROUTE_DELIVERY",
            LoadStatus::AtDelivery => "AT_DELIVERY",
            LoadStatus::Delivered => "DELIVERED",
        }
    }

    /// Statuses eligible for automatic tracking updates.
    pub fn is_active(&self) -> bool {
        !matches!(self, LoadStatus::AtDelivery | LoadStatus::Delivered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown load status '{0}'")]
pub struct ParseLoadStatusError(pub String);

impl FromStr for LoadStatus {
    type Err = ParseLoadStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASSIGNED" => Ok(LoadStatus::Assigned),
            "EN_ROUTE_PICKUP" => Ok(LoadStatus::EnRoutePickup),
            "AT_PICKUP" => Ok(LoadStatus::AtPickup),
            "LOADED" => Ok(LoadStatus::Loaded),
            "EN_ROUTE_DELIVERY" => Ok(LoadStatus::EnRouteDelivery),
            "AT_DELIVERY" => Ok(LoadStatus::AtDelivery),
            "DELIVERED" => Ok(LoadStatus::Delivered),
            other => Err(ParseLoadStatusError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopType {
    Pickup,
    Delivery,
}

impl StopType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopType::Pickup => "PICKUP",
            StopType::Delivery => "DELIVERY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stop type '{0}'")]
pub struct ParseStopTypeError(pub String);

impl FromStr for StopType {
    type Err = ParseStopTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PICKUP" => Ok(StopType::Pickup),
            "DELIVERY" => Ok(StopType::Delivery),
            other => Err(ParseStopTypeError(other.to_string())),
        }
    }
}

/// A pickup or delivery stop on a load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub stop_type: StopType,
    pub sequence: i64,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub address: String,
    /// Stored coordinates, resolved ahead of geocoding when present.
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// A load as seen by the tracking subsystem.
///
/// Owned by the surrounding TMS; this subsystem reads it and writes only
/// `status` plus appended history rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub id: String,
    pub load_number: String,
    pub status: LoadStatus,
    /// Telematics identifier of the assigned vehicle.
    pub vehicle_id: Option<String>,
    pub total_miles: Option<f64>,
    /// Stored route geometry as an encoded polyline, when the TMS has one.
    #[serde(default)]
    pub route_polyline: Option<String>,
    /// Stops ordered by sequence.
    pub stops: Vec<Stop>,
}

impl Load {
    /// First pickup stop by sequence.
    pub fn pickup_stop(&self) -> Option<&Stop> {
        self.stops.iter().find(|s| s.stop_type == StopType::Pickup)
    }

    /// Last delivery stop by sequence.
    pub fn delivery_stop(&self) -> Option<&Stop> {
        self.stops
            .iter()
            .rev()
            .find(|s| s.stop_type == StopType::Delivery)
    }
}

/// Append-only audit row recorded for every accepted status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadStatusHistory {
    pub id: String,
    pub load_id: String,
    pub status: LoadStatus,
    pub notes: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Telemetry snapshot for one vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehiclePosition {
    pub vehicle_id: String,
    /// None when the telematics provider has no current fix.
    pub location: Option<Coordinate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in LoadStatus::ALL {
            assert_eq!(status.as_str().parse::<LoadStatus>(), Ok(status));
        }
        assert!("UNKNOWN".parse::<LoadStatus>().is_err());
    }

    #[test]
    fn only_delivery_side_terminals_are_inactive() {
        let active: Vec<LoadStatus> = LoadStatus::ALL
            .into_iter()
            .filter(LoadStatus::is_active)
            .collect();
        assert_eq!(active.len(), 5);
        assert!(!LoadStatus::AtDelivery.is_active());
        assert!(!LoadStatus::Delivered.is_active());
    }

    #[test]
    fn enums_serialize_in_the_tms_wire_format() {
        assert_eq!(
            serde_json::to_string(&LoadStatus::EnRoutePickup).unwrap(),
            "\"EN_ROUTE_PICKUP\""
        );
        assert_eq!(serde_json::to_string(&Urgency::High).unwrap(), "\"HIGH\"");
        assert_eq!(
            serde_json::to_string(&StopType::Pickup).unwrap(),
            "\"PICKUP\""
        );
    }

    #[test]
    fn pickup_and_delivery_stop_selection() {
        let load = Load {
            id: "l1".into(),
            load_number: "LH-1001".into(),
            status: LoadStatus::Assigned,
            vehicle_id: Some("v1".into()),
            total_miles: Some(500.0),
            route_polyline: None,
            stops: vec![
                Stop {
                    id: "s1".into(),
                    stop_type: StopType::Pickup,
                    sequence: 1,
                    city: "Dallas".into(),
                    state: "TX".into(),
                    address: String::new(),
                    lat: None,
                    lng: None,
                },
                Stop {
                    id: "s2".into(),
                    stop_type: StopType::Delivery,
                    sequence: 2,
                    city: "Tulsa".into(),
                    state: "OK".into(),
                    address: String::new(),
                    lat: None,
                    lng: None,
                },
                Stop {
                    id: "s3".into(),
                    stop_type: StopType::Delivery,
                    sequence: 3,
                    city: "Kansas City".into(),
                    state: "MO".into(),
                    address: String::new(),
                    lat: None,
                    lng: None,
                },
            ],
        };

        assert_eq!(load.pickup_stop().unwrap().id, "s1");
        // Multi-stop loads track against the final delivery.
        assert_eq!(load.delivery_stop().unwrap().id, "s3");
    }
}
