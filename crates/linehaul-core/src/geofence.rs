//! Circular geofence proximity test.

use crate::geo;
use crate::models::Coordinate;

/// Default geofence radius around a stop (~500 m).
pub const DEFAULT_GEOFENCE_RADIUS_KM: f64 = 0.5;

/// True when `point` lies within `radius_km` of `reference`.
/// The boundary is inclusive.
pub fn is_near(point: Coordinate, reference: Coordinate, radius_km: f64) -> bool {
    geo::distance_km(point, reference) <= radius_km
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_the_radius_is_near() {
        let stop = Coordinate::new(32.7767, -96.7970);
        let truck = Coordinate::new(32.7790, -96.7970); // ~0.26 km north
        assert!(is_near(truck, stop, DEFAULT_GEOFENCE_RADIUS_KM));
    }

    #[test]
    fn outside_the_radius_is_not_near() {
        let stop = Coordinate::new(32.7767, -96.7970);
        let truck = Coordinate::new(32.7900, -96.7970); // ~1.5 km north
        assert!(!is_near(truck, stop, DEFAULT_GEOFENCE_RADIUS_KM));
    }

    #[test]
    fn boundary_is_inclusive() {
        let reference = Coordinate::new(0.0, 0.0);
        let point = Coordinate::new(0.01, 0.0);
        let exact = geo::distance_km(point, reference);
        assert!(is_near(point, reference, exact));
        assert!(!is_near(point, reference, exact - 1e-9));
    }

    #[test]
    fn same_point_is_always_near() {
        let p = Coordinate::new(41.8781, -87.6298);
        assert!(is_near(p, p, 0.0));
    }
}
