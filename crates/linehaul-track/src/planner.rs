//! Route fuel planning orchestration.
//!
//! Resolves route geometry, samples it, discovers stations around each
//! sample through the station provider, and hands the deduplicated result
//! to the core suggestion engine.

use std::sync::Arc;

use anyhow::Result;

use linehaul_core::catalog::dedupe_stations;
use linehaul_core::fuel::{FuelPlanConfig, FuelSuggestionEngine};
use linehaul_core::models::{
    Coordinate, FuelStation, FuelSuggestion, Load, RouteFuelPlan, Stop, TollEstimate,
};
use linehaul_core::{polyline, sample};

use crate::providers::{
    DirectionsProvider, FuelStationProvider, FuelType, GeocodeProvider, RouteWaypoint,
    TollEstimator,
};

/// Which strategy produced the route geometry.
///
/// The fallback order is part of the contract: a stored polyline wins, a
/// recomputed route comes next, raw stop coordinates are the last resort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGeometrySource {
    StoredPolyline,
    Directions,
    StopCoordinates,
}

/// Plans fuel stops along a load's route.
///
/// Collaborators are injected; the planner never constructs its own
/// providers.
pub struct RouteFuelPlanner {
    stations: Arc<dyn FuelStationProvider>,
    geocoder: Arc<dyn GeocodeProvider>,
    directions: Option<Arc<dyn DirectionsProvider>>,
    tolls: Option<Arc<dyn TollEstimator>>,
    engine: FuelSuggestionEngine,
}

impl RouteFuelPlanner {
    pub fn new(
        stations: Arc<dyn FuelStationProvider>,
        geocoder: Arc<dyn GeocodeProvider>,
        config: FuelPlanConfig,
    ) -> Self {
        Self {
            stations,
            geocoder,
            directions: None,
            tolls: None,
            engine: FuelSuggestionEngine::new(config),
        }
    }

    pub fn with_directions(mut self, directions: Arc<dyn DirectionsProvider>) -> Self {
        self.directions = Some(directions);
        self
    }

    pub fn with_tolls(mut self, tolls: Arc<dyn TollEstimator>) -> Self {
        self.tolls = Some(tolls);
        self
    }

    /// Build the complete fuel plan for a load.
    ///
    /// Only priced stations make it into the plan; suggestions are capped
    /// at 3. A load with no resolvable geometry yields an empty plan, not
    /// an error.
    pub async fn route_fuel_plan(
        &self,
        load: &Load,
        driver: Option<Coordinate>,
    ) -> Result<RouteFuelPlan> {
        let discovered = self.stations_along_route(load).await?;
        let stations: Vec<FuelStation> = discovered
            .into_iter()
            .filter(|s| s.diesel_price.is_some())
            .collect();

        let average = self.engine.average_price(&stations);
        let cheapest = self.engine.cheapest_price(&stations);
        let mut suggestions = self.engine.generate_suggestions(&stations, average, driver);
        suggestions.truncate(3);

        let toll_estimate = self.toll_estimate(load).await;
        let estimated_total_fuel_cost = self
            .engine
            .estimated_fuel_cost(load.total_miles.unwrap_or(0.0), average);

        Ok(RouteFuelPlan {
            load_id: load.id.clone(),
            stations,
            suggestions,
            average_diesel_price: average,
            cheapest_diesel_price: cheapest,
            estimated_total_fuel_cost,
            toll_estimate,
        })
    }

    /// Urgency-tiered suggestions for a driver currently on the road.
    pub async fn smart_suggestions(
        &self,
        load: &Load,
        driver: Coordinate,
        fuel_percent: Option<f64>,
    ) -> Result<Vec<FuelSuggestion>> {
        let plan = self.route_fuel_plan(load, Some(driver)).await?;
        Ok(self.engine.smart_suggestions(
            &plan.stations,
            plan.average_diesel_price,
            driver,
            fuel_percent,
        ))
    }

    /// Ad-hoc station search around a point, cheapest first.
    pub async fn nearby_stations(
        &self,
        lat: f64,
        lng: f64,
        radius_miles: f64,
    ) -> Result<Vec<FuelStation>> {
        let here = Coordinate::new(lat, lng);
        let mut stations = self
            .stations
            .search_nearby(lat, lng, radius_miles, FuelType::Diesel)
            .await?;

        for s in &mut stations {
            s.distance_from_route =
                Some(linehaul_core::geo::distance_miles(here, Coordinate::new(s.lat, s.lng)));
        }
        stations.sort_by(|a, b| {
            let pa = a.diesel_price.unwrap_or(f64::INFINITY);
            let pb = b.diesel_price.unwrap_or(f64::INFINITY);
            pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(stations)
    }

    /// Resolve the path to sample, trying each geometry source in order.
    /// `None` means no strategy produced any points.
    pub async fn resolve_route_geometry(
        &self,
        load: &Load,
    ) -> Option<(Vec<Coordinate>, RouteGeometrySource)> {
        if let Some(encoded) = load.route_polyline.as_deref() {
            let points = polyline::decode(encoded);
            if !points.is_empty() {
                return Some((points, RouteGeometrySource::StoredPolyline));
            }
        }

        if let Some(directions) = &self.directions {
            let waypoints = directions_waypoints(load);
            if waypoints.len() >= 2 {
                match directions.calculate_route(&waypoints).await {
                    Ok(Some(route)) => {
                        let points = polyline::decode(&route.polyline);
                        if !points.is_empty() {
                            return Some((points, RouteGeometrySource::Directions));
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!("Directions lookup failed for load {}: {err}", load.id);
                    }
                }
            }
        }

        let points: Vec<Coordinate> = load
            .stops
            .iter()
            .filter_map(stop_coordinate)
            .collect();
        if !points.is_empty() {
            return Some((points, RouteGeometrySource::StopCoordinates));
        }

        None
    }

    /// Stations discovered near every route sample, deduplicated.
    ///
    /// One sample's failed provider query drops only that sample's
    /// contribution.
    async fn stations_along_route(&self, load: &Load) -> Result<Vec<FuelStation>> {
        let Some((path, source)) = self.resolve_route_geometry(load).await else {
            tracing::debug!("No route geometry for load {}", load.id);
            return Ok(Vec::new());
        };
        tracing::debug!("Load {} route geometry from {:?}", load.id, source);

        let samples = sample::sample_points(&path, self.engine.config.sample_interval_miles);
        let mut all = Vec::new();

        for point in &samples {
            let found = self
                .stations
                .search_nearby(
                    point.lat,
                    point.lng,
                    self.engine.config.search_radius_miles,
                    FuelType::Diesel,
                )
                .await;
            match found {
                Ok(stations) => {
                    for mut station in stations {
                        station.miles_along_route = Some(point.miles_from_start);
                        all.push(station);
                    }
                }
                Err(err) => {
                    tracing::warn!(
                        "Station search failed at mile {:.0} for load {}: {err}",
                        point.miles_from_start,
                        load.id
                    );
                }
            }
        }

        Ok(dedupe_stations(all))
    }

    /// Toll estimate for the trip, when a toll collaborator is configured.
    ///
    /// Prefers exact stop coordinates; falls back to geocoding the pickup
    /// and delivery city/state. Any failure degrades to `None`.
    async fn toll_estimate(&self, load: &Load) -> Option<TollEstimate> {
        let tolls = self.tolls.as_ref()?;

        let coords: Vec<Coordinate> = load.stops.iter().filter_map(stop_coordinate).collect();
        if coords.len() >= 2 {
            let origin = coords[0];
            let destination = coords[coords.len() - 1];
            let via = &coords[1..coords.len() - 1];
            return match tolls.calculate_tolls(origin, destination, via).await {
                Ok(estimate) => estimate,
                Err(err) => {
                    tracing::warn!("Toll estimate failed for load {}: {err}", load.id);
                    None
                }
            };
        }

        let pickup = load.pickup_stop()?;
        let delivery = load.delivery_stop()?;
        let origin = self.geocode_stop(pickup).await?;
        let destination = self.geocode_stop(delivery).await?;
        match tolls.calculate_tolls(origin, destination, &[]).await {
            Ok(estimate) => estimate,
            Err(err) => {
                tracing::warn!("Toll estimate failed for load {}: {err}", load.id);
                None
            }
        }
    }

    async fn geocode_stop(&self, stop: &Stop) -> Option<Coordinate> {
        let address = format!("{}, {}", stop.city, stop.state);
        match self.geocoder.geocode(&address).await {
            Ok(coord) => coord,
            Err(err) => {
                tracing::warn!("Geocoding failed for {address}: {err}");
                None
            }
        }
    }
}

fn stop_coordinate(stop: &Stop) -> Option<Coordinate> {
    match (stop.lat, stop.lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
        _ => None,
    }
}

/// Waypoints for a directions request: exact coordinates where stored,
/// city/state addresses otherwise.
fn directions_waypoints(load: &Load) -> Vec<RouteWaypoint> {
    load.stops
        .iter()
        .map(|stop| match stop_coordinate(stop) {
            Some(point) => RouteWaypoint::Point(point),
            None => RouteWaypoint::Address(format!("{}, {}", stop.city, stop.state)),
        })
        .collect()
}
