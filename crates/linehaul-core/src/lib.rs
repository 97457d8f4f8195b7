pub mod catalog;
pub mod fuel;
pub mod geo;
pub mod geofence;
pub mod models;
pub mod polyline;
pub mod sample;
pub mod status;

pub use catalog::dedupe_stations;
pub use fuel::{FuelPlanConfig, FuelSuggestionEngine};
pub use geo::{distance_km, distance_miles};
pub use geofence::{is_near, DEFAULT_GEOFENCE_RADIUS_KM};
pub use models::{
    Coordinate, FuelStation, FuelSuggestion, Load, LoadStatus, LoadStatusHistory,
    ParseLoadStatusError, ParseStopTypeError, RouteFuelPlan, SamplePoint, Stop, StopType,
    TollEstimate, Urgency, VehiclePosition,
};
pub use sample::sample_points;
pub use status::next_status;
