//! Geofence-driven load status tracking.
//!
//! Pulls current vehicle positions, evaluates stop geofences, advances the
//! load status state machine, and persists accepted transitions. Failures
//! are isolated per load: one bad load never aborts the batch.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use linehaul_core::geofence;
use linehaul_core::models::{Coordinate, Load, Stop};
use linehaul_core::status::next_status;

use crate::config::TrackingConfig;
use crate::persistence::{loads, Database};
use crate::providers::{GeocodeProvider, VehicleTelemetryProvider};

/// Note attached to automated history rows.
const AUTOMATION_NOTE: &str = "Auto-updated via location tracking";
/// Author recorded for automated transitions.
const AUTOMATION_ACTOR: &str = "SYSTEM";

/// Result of one company's tracking pass.
#[derive(Debug, Default, Clone)]
pub struct BatchOutcome {
    pub processed: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

/// Result of a pass over every telemetry-enabled company.
#[derive(Debug, Default, Clone)]
pub struct FleetOutcome {
    pub companies: usize,
    pub total_processed: usize,
    pub total_updated: usize,
    pub errors: Vec<String>,
}

/// Advances load statuses from live vehicle telemetry.
pub struct TrackingOrchestrator {
    db: Database,
    telemetry: Arc<dyn VehicleTelemetryProvider>,
    geocoder: Arc<dyn GeocodeProvider>,
    config: TrackingConfig,
}

impl TrackingOrchestrator {
    pub fn new(
        db: Database,
        telemetry: Arc<dyn VehicleTelemetryProvider>,
        geocoder: Arc<dyn GeocodeProvider>,
        config: TrackingConfig,
    ) -> Self {
        Self {
            db,
            telemetry,
            geocoder,
            config,
        }
    }

    /// Process every active load for one company.
    ///
    /// Always returns an outcome; provider or persistence failures become
    /// entries in `errors` rather than propagating.
    pub async fn process_company(&self, company_id: &str) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        let active = match loads::active_loads_with_vehicles(self.db.pool(), company_id).await {
            Ok(active) => active,
            Err(err) => {
                outcome.errors.push(format!("loading active loads: {err}"));
                return outcome;
            }
        };
        outcome.processed = active.len();

        let mut vehicle_ids: Vec<String> = active
            .iter()
            .filter_map(|l| l.vehicle_id.clone())
            .collect();
        vehicle_ids.sort();
        vehicle_ids.dedup();
        if vehicle_ids.is_empty() {
            tracing::debug!("No vehicles assigned for company {company_id}");
            return outcome;
        }

        // One batched telemetry call for the whole company.
        let positions = match self.telemetry.get_locations(&vehicle_ids, company_id).await {
            Ok(positions) => positions,
            Err(err) => {
                outcome.errors.push(format!("fetching telemetry: {err}"));
                return outcome;
            }
        };
        let by_vehicle: HashMap<String, Option<Coordinate>> = positions
            .into_iter()
            .map(|p| (p.vehicle_id, p.location))
            .collect();

        for load in &active {
            match self.process_load(load, &by_vehicle).await {
                Ok(true) => outcome.updated += 1,
                Ok(false) => {}
                Err(err) => {
                    outcome
                        .errors
                        .push(format!("load {}: {err}", load.load_number));
                }
            }
        }

        outcome
    }

    /// Run a tracking pass for every telemetry-enabled company.
    pub async fn process_all_companies(&self) -> FleetOutcome {
        let mut fleet = FleetOutcome::default();

        let companies = match loads::telemetry_enabled_companies(self.db.pool()).await {
            Ok(companies) => companies,
            Err(err) => {
                fleet.errors.push(format!("loading companies: {err}"));
                return fleet;
            }
        };
        fleet.companies = companies.len();

        for company_id in &companies {
            let outcome = self.process_company(company_id).await;
            fleet.total_processed += outcome.processed;
            fleet.total_updated += outcome.updated;
            fleet.errors.extend(outcome.errors);
        }

        fleet
    }

    /// Evaluate one load against its vehicle position. Returns whether a
    /// transition was persisted. Missing telemetry is "nothing to do", not
    /// an error.
    async fn process_load(
        &self,
        load: &Load,
        positions: &HashMap<String, Option<Coordinate>>,
    ) -> Result<bool> {
        let Some(vehicle_id) = load.vehicle_id.as_deref() else {
            return Ok(false);
        };
        let Some(Some(truck)) = positions.get(vehicle_id) else {
            return Ok(false);
        };

        let near_pickup = match load.pickup_stop() {
            Some(stop) => self.near_stop(*truck, stop).await,
            None => false,
        };
        let near_delivery = match load.delivery_stop() {
            Some(stop) => self.near_stop(*truck, stop).await,
            None => false,
        };

        let Some(next) = next_status(load.status, near_pickup, near_delivery) else {
            return Ok(false);
        };

        loads::apply_status_transition(
            self.db.pool(),
            &load.id,
            next,
            AUTOMATION_NOTE,
            Some(*truck),
            AUTOMATION_ACTOR,
        )
        .await?;

        tracing::info!(
            "Updated {}: {} -> {}",
            load.load_number,
            load.status.as_str(),
            next.as_str()
        );
        Ok(true)
    }

    /// Is the truck inside the stop's arrival geofence? A stop whose
    /// coordinates cannot be resolved is treated as "not near".
    async fn near_stop(&self, truck: Coordinate, stop: &Stop) -> bool {
        match self.resolve_stop_coords(stop).await {
            Some(reference) => geofence::is_near(truck, reference, self.config.geofence_radius_km),
            None => false,
        }
    }

    /// Stored coordinates first, geocoding second.
    async fn resolve_stop_coords(&self, stop: &Stop) -> Option<Coordinate> {
        if let (Some(lat), Some(lng)) = (stop.lat, stop.lng) {
            return Some(Coordinate::new(lat, lng));
        }

        if stop.city.is_empty() || stop.state.is_empty() {
            return None;
        }
        let address = [stop.address.as_str(), stop.city.as_str(), stop.state.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        match self.geocoder.geocode(&address).await {
            Ok(coord) => coord,
            Err(err) => {
                tracing::warn!("Geocoding failed for stop {}: {err}", stop.id);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::db::init_database;
    use anyhow::Result;
    use linehaul_core::models::VehiclePosition;
    use sqlx::SqlitePool;

    struct FakeTelemetry {
        positions: Vec<VehiclePosition>,
        fail: bool,
    }

    impl FakeTelemetry {
        fn at(vehicle_id: &str, coord: Coordinate) -> Arc<Self> {
            Arc::new(Self {
                positions: vec![VehiclePosition {
                    vehicle_id: vehicle_id.into(),
                    location: Some(coord),
                }],
                fail: false,
            })
        }

        fn dark(vehicle_id: &str) -> Arc<Self> {
            Arc::new(Self {
                positions: vec![VehiclePosition {
                    vehicle_id: vehicle_id.into(),
                    location: None,
                }],
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                positions: Vec::new(),
                fail: true,
            })
        }
    }

    #[async_trait::async_trait]
    impl VehicleTelemetryProvider for FakeTelemetry {
        async fn get_locations(
            &self,
            _vehicle_ids: &[String],
            _company_id: &str,
        ) -> Result<Vec<VehiclePosition>> {
            if self.fail {
                anyhow::bail!("telematics API down");
            }
            Ok(self.positions.clone())
        }
    }

    struct FakeGeocoder {
        result: Option<Coordinate>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl GeocodeProvider for FakeGeocoder {
        async fn geocode(&self, _address: &str) -> Result<Option<Coordinate>> {
            if self.fail {
                anyhow::bail!("geocoder quota exceeded");
            }
            Ok(self.result)
        }
    }

    const PICKUP: Coordinate = Coordinate {
        lat: 32.7767,
        lng: -96.7970,
    };
    const DELIVERY: Coordinate = Coordinate {
        lat: 36.1540,
        lng: -95.9928,
    };
    // ~0.2 km from the delivery stop.
    const NEAR_DELIVERY: Coordinate = Coordinate {
        lat: 36.1558,
        lng: -95.9928,
    };

    async fn seed(pool: &SqlitePool, status: &str, with_coords: bool) {
        sqlx::query(
            "INSERT INTO loads (id, company_id, load_number, status, vehicle_id, total_miles) VALUES ('l1', 'c1', 'LH-1001', ?1, 'v1', 500.0)",
        )
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO company_integrations (company_id, provider, active) VALUES ('c1', 'TELEMATICS', 1)",
        )
        .execute(pool)
        .await
        .unwrap();

        let (p, d) = if with_coords {
            (Some(PICKUP), Some(DELIVERY))
        } else {
            (None, None)
        };
        sqlx::query(
            "INSERT INTO stops (id, load_id, stop_type, sequence, city, state, lat, lng) VALUES ('s1', 'l1', 'PICKUP', 1, 'Dallas', 'TX', ?1, ?2)",
        )
        .bind(p.map(|c| c.lat))
        .bind(p.map(|c| c.lng))
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO stops (id, load_id, stop_type, sequence, city, state, lat, lng) VALUES ('s2', 'l1', 'DELIVERY', 2, 'Tulsa', 'OK', ?1, ?2)",
        )
        .bind(d.map(|c| c.lat))
        .bind(d.map(|c| c.lng))
        .execute(pool)
        .await
        .unwrap();
    }

    fn orchestrator(
        db: Database,
        telemetry: Arc<FakeTelemetry>,
        geocoder: FakeGeocoder,
    ) -> TrackingOrchestrator {
        TrackingOrchestrator::new(db, telemetry, Arc::new(geocoder), TrackingConfig::default())
    }

    async fn status_of(pool: &SqlitePool, load_id: &str) -> String {
        sqlx::query_as::<_, (String,)>("SELECT status FROM loads WHERE id = ?1")
            .bind(load_id)
            .fetch_one(pool)
            .await
            .unwrap()
            .0
    }

    #[tokio::test]
    async fn arrival_at_delivery_updates_status_and_audit_trail() {
        let db = init_database(":memory:", 1).await.unwrap();
        seed(db.pool(), "EN_ROUTE_DELIVERY", true).await;
        let tracker = orchestrator(
            db.clone(),
            FakeTelemetry::at("v1", NEAR_DELIVERY),
            FakeGeocoder {
                result: None,
                fail: false,
            },
        );

        let outcome = tracker.process_company("c1").await;
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.updated, 1);
        assert!(outcome.errors.is_empty());
        assert_eq!(status_of(db.pool(), "l1").await, "AT_DELIVERY");

        let history = loads::load_status_history(db.pool(), "l1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].created_by, "SYSTEM");
        assert_eq!(history[0].notes, "Auto-updated via location tracking");
        assert_eq!(history[0].lat, Some(NEAR_DELIVERY.lat));
        assert_eq!(history[0].lng, Some(NEAR_DELIVERY.lng));
    }

    #[tokio::test]
    async fn rerunning_with_unchanged_telemetry_is_idempotent() {
        let db = init_database(":memory:", 1).await.unwrap();
        seed(db.pool(), "EN_ROUTE_DELIVERY", true).await;
        let tracker = orchestrator(
            db.clone(),
            FakeTelemetry::at("v1", NEAR_DELIVERY),
            FakeGeocoder {
                result: None,
                fail: false,
            },
        );

        let first = tracker.process_company("c1").await;
        assert_eq!(first.updated, 1);

        // AT_DELIVERY is terminal for automation: the load no longer shows
        // up as active, so nothing changes and no second row is written.
        let second = tracker.process_company("c1").await;
        assert_eq!(second.processed, 0);
        assert_eq!(second.updated, 0);

        let history = loads::load_status_history(db.pool(), "l1").await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn truck_far_from_both_stops_changes_nothing() {
        let db = init_database(":memory:", 1).await.unwrap();
        seed(db.pool(), "ASSIGNED", true).await;
        let tracker = orchestrator(
            db.clone(),
            FakeTelemetry::at("v1", Coordinate::new(34.0, -96.0)),
            FakeGeocoder {
                result: None,
                fail: false,
            },
        );

        let outcome = tracker.process_company("c1").await;
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.updated, 0);
        assert_eq!(status_of(db.pool(), "l1").await, "ASSIGNED");
    }

    #[tokio::test]
    async fn missing_telemetry_skips_the_load_without_error() {
        let db = init_database(":memory:", 1).await.unwrap();
        seed(db.pool(), "EN_ROUTE_DELIVERY", true).await;
        let tracker = orchestrator(
            db.clone(),
            FakeTelemetry::dark("v1"),
            FakeGeocoder {
                result: None,
                fail: false,
            },
        );

        let outcome = tracker.process_company("c1").await;
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.updated, 0);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn geocoded_stops_drive_transitions_when_coords_are_missing() {
        let db = init_database(":memory:", 1).await.unwrap();
        seed(db.pool(), "ASSIGNED", false).await;
        // Geocoder resolves every stop to the pickup location, so the truck
        // parked there is near pickup.
        let tracker = orchestrator(
            db.clone(),
            FakeTelemetry::at("v1", PICKUP),
            FakeGeocoder {
                result: Some(PICKUP),
                fail: false,
            },
        );

        let outcome = tracker.process_company("c1").await;
        assert_eq!(outcome.updated, 1);
        assert_eq!(status_of(db.pool(), "l1").await, "AT_PICKUP");
    }

    #[tokio::test]
    async fn geocoding_failure_means_not_near_rather_than_an_error() {
        let db = init_database(":memory:", 1).await.unwrap();
        seed(db.pool(), "ASSIGNED", false).await;
        let tracker = orchestrator(
            db.clone(),
            FakeTelemetry::at("v1", PICKUP),
            FakeGeocoder {
                result: None,
                fail: true,
            },
        );

        let outcome = tracker.process_company("c1").await;
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.updated, 0);
        assert!(outcome.errors.is_empty());
        assert_eq!(status_of(db.pool(), "l1").await, "ASSIGNED");
    }

    #[tokio::test]
    async fn telemetry_outage_is_reported_not_thrown() {
        let db = init_database(":memory:", 1).await.unwrap();
        seed(db.pool(), "EN_ROUTE_DELIVERY", true).await;
        let tracker = orchestrator(
            db.clone(),
            FakeTelemetry::failing(),
            FakeGeocoder {
                result: None,
                fail: false,
            },
        );

        let outcome = tracker.process_company("c1").await;
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("telematics API down"));
    }

    #[tokio::test]
    async fn failed_status_write_becomes_a_batch_error() {
        let db = init_database(":memory:", 1).await.unwrap();
        seed(db.pool(), "EN_ROUTE_DELIVERY", true).await;
        // Break the audit table so the transition transaction fails.
        sqlx::query("DROP TABLE load_status_history")
            .execute(db.pool())
            .await
            .unwrap();
        let tracker = orchestrator(
            db.clone(),
            FakeTelemetry::at("v1", NEAR_DELIVERY),
            FakeGeocoder {
                result: None,
                fail: false,
            },
        );

        let outcome = tracker.process_company("c1").await;
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("LH-1001"));
        // The status update rolled back with the failed audit insert.
        assert_eq!(status_of(db.pool(), "l1").await, "EN_ROUTE_DELIVERY");
    }

    #[tokio::test]
    async fn fleet_pass_accumulates_across_companies() {
        let db = init_database(":memory:", 1).await.unwrap();
        seed(db.pool(), "EN_ROUTE_DELIVERY", true).await;
        sqlx::query(
            "INSERT INTO company_integrations (company_id, provider, active) VALUES ('c2', 'TELEMATICS', 1)",
        )
        .execute(db.pool())
        .await
        .unwrap();
        let tracker = orchestrator(
            db.clone(),
            FakeTelemetry::at("v1", NEAR_DELIVERY),
            FakeGeocoder {
                result: None,
                fail: false,
            },
        );

        let fleet = tracker.process_all_companies().await;
        assert_eq!(fleet.companies, 2);
        assert_eq!(fleet.total_processed, 1);
        assert_eq!(fleet.total_updated, 1);
        assert!(fleet.errors.is_empty());
    }

    #[tokio::test]
    async fn loaded_truck_leaving_pickup_goes_en_route() {
        let db = init_database(":memory:", 1).await.unwrap();
        seed(db.pool(), "LOADED", true).await;
        // ~5 km from pickup, nowhere near delivery.
        let tracker = orchestrator(
            db.clone(),
            FakeTelemetry::at("v1", Coordinate::new(32.82, -96.797)),
            FakeGeocoder {
                result: None,
                fail: false,
            },
        );

        let outcome = tracker.process_company("c1").await;
        assert_eq!(outcome.updated, 1);
        assert_eq!(status_of(db.pool(), "l1").await, "EN_ROUTE_DELIVERY");

        // Same telemetry again: EN_ROUTE_DELIVERY away from both geofences
        // has no matching rule, so nothing is written twice.
        let again = tracker.process_company("c1").await;
        assert_eq!(again.processed, 1);
        assert_eq!(again.updated, 0);
        let history = loads::load_status_history(db.pool(), "l1").await.unwrap();
        assert_eq!(history.len(), 1);
    }
}
