//! Tracking configuration from environment.

use std::env;

use linehaul_core::geofence::DEFAULT_GEOFENCE_RADIUS_KM;

#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Arrival geofence radius around a stop, in kilometers.
    pub geofence_radius_km: f64,
    /// Seconds between tracking passes when running the loop.
    pub poll_interval_secs: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            geofence_radius_km: DEFAULT_GEOFENCE_RADIUS_KM,
            poll_interval_secs: 60,
        }
    }
}

impl TrackingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            geofence_radius_km: env::var("LINEHAUL_GEOFENCE_RADIUS_KM")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.geofence_radius_km),
            poll_interval_secs: env::var("LINEHAUL_TRACKING_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.poll_interval_secs),
        }
    }
}
