//! External collaborator contracts.
//!
//! The planner and tracker take these as injected dependencies; the HTTP
//! implementations (telematics, mapping, station-price APIs) live in the
//! surrounding application. Tests substitute fakes.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use linehaul_core::models::{Coordinate, FuelStation, TollEstimate, VehiclePosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Diesel,
}

/// A stop on a directions request: either a freeform address or exact
/// coordinates, depending on what the load record carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RouteWaypoint {
    Address(String),
    Point(Coordinate),
}

/// Result of a directions calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePolyline {
    /// Encoded polyline of the computed route.
    pub polyline: String,
}

/// Searches for fuel stations around a point.
#[async_trait]
pub trait FuelStationProvider: Send + Sync {
    async fn search_nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_miles: f64,
        fuel_type: FuelType,
    ) -> Result<Vec<FuelStation>>;
}

/// Computes route geometry between waypoints. Only consulted when a load
/// has no stored polyline.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn calculate_route(&self, waypoints: &[RouteWaypoint]) -> Result<Option<RoutePolyline>>;
}

/// Resolves a freeform address to coordinates.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>>;
}

/// Batched current-position lookup for a company's vehicles.
#[async_trait]
pub trait VehicleTelemetryProvider: Send + Sync {
    async fn get_locations(
        &self,
        vehicle_ids: &[String],
        company_id: &str,
    ) -> Result<Vec<VehiclePosition>>;
}

/// Estimates toll costs for a trip.
#[async_trait]
pub trait TollEstimator: Send + Sync {
    async fn calculate_tolls(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        waypoints: &[Coordinate],
    ) -> Result<Option<TollEstimate>>;
}
