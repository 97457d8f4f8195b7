//! Route fuel planning and geofence-driven load status tracking.

pub mod config;
pub mod loops;
pub mod persistence;
pub mod planner;
pub mod providers;
pub mod tracker;

pub use config::TrackingConfig;
pub use planner::{RouteFuelPlanner, RouteGeometrySource};
pub use providers::{
    DirectionsProvider, FuelStationProvider, FuelType, GeocodeProvider, RoutePolyline,
    RouteWaypoint, TollEstimator, VehicleTelemetryProvider,
};
pub use tracker::{BatchOutcome, FleetOutcome, TrackingOrchestrator};
