//! Great-circle distance math shared by the fuel planner and geofencing.

use crate::models::Coordinate;

/// Mean earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3_958.8;
/// Mean earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Haversine great-circle distance between two coordinates in miles.
///
/// Symmetric, and zero (modulo floating error) iff both points are equal.
/// Coordinates are not validated here.
pub fn distance_miles(a: Coordinate, b: Coordinate) -> f64 {
    EARTH_RADIUS_MILES * haversine_angle(a, b)
}

/// Haversine great-circle distance between two coordinates in kilometers.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    EARTH_RADIUS_KM * haversine_angle(a, b)
}

fn haversine_angle(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lng - a.lng).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}
