//! Fuel suggestion engine: pricing stats and urgency-tiered suggestions.

use serde::{Deserialize, Serialize};

use crate::geo;
use crate::models::{Coordinate, FuelStation, FuelSuggestion, Urgency};

/// Tuning knobs for route fuel planning.
///
/// Lifted out of the call sites so tests and alternate deployments can vary
/// them; the defaults match production behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelPlanConfig {
    /// Miles between route samples.
    pub sample_interval_miles: f64,
    /// Station search radius around each sample, in miles.
    pub search_radius_miles: f64,
    /// Fuel percentage below which a stop is urgent.
    pub low_fuel_threshold_pct: f64,
    /// Fuel percentage below which savings-driven stops are considered.
    pub medium_fuel_threshold_pct: f64,
    /// $/gal below the route average needed to flag a savings stop.
    pub price_savings_threshold: f64,
    /// "Nearby" radius around the driver, in miles.
    pub nearby_radius_miles: f64,
    /// Assumed truck fuel economy for cost estimates.
    pub assumed_mpg: f64,
}

impl Default for FuelPlanConfig {
    fn default() -> Self {
        Self {
            sample_interval_miles: 100.0,
            search_radius_miles: 15.0,
            low_fuel_threshold_pct: 25.0,
            medium_fuel_threshold_pct: 50.0,
            price_savings_threshold: 0.15,
            nearby_radius_miles: 20.0,
            assumed_mpg: 6.5,
        }
    }
}

/// Pure suggestion/pricing logic over already-discovered stations.
///
/// Station discovery and provider I/O live in the orchestration layer; the
/// engine only ranks and annotates.
#[derive(Debug, Clone, Default)]
pub struct FuelSuggestionEngine {
    pub config: FuelPlanConfig,
}

impl FuelSuggestionEngine {
    pub fn new(config: FuelPlanConfig) -> Self {
        Self { config }
    }

    /// Average diesel price over priced stations; 0 when none are priced.
    pub fn average_price(&self, stations: &[FuelStation]) -> f64 {
        let prices: Vec<f64> = stations.iter().filter_map(|s| s.diesel_price).collect();
        if prices.is_empty() {
            return 0.0;
        }
        prices.iter().sum::<f64>() / prices.len() as f64
    }

    /// Lowest known diesel price; 0 when none are priced.
    pub fn cheapest_price(&self, stations: &[FuelStation]) -> f64 {
        let cheapest = stations
            .iter()
            .filter_map(|s| s.diesel_price)
            .fold(f64::INFINITY, f64::min);
        if cheapest.is_finite() {
            cheapest
        } else {
            0.0
        }
    }

    /// Estimated route fuel spend: `(miles / assumed_mpg) * avg_price`.
    /// Zero when miles or price are non-positive.
    pub fn estimated_fuel_cost(&self, total_miles: f64, avg_price: f64) -> f64 {
        if total_miles <= 0.0 || avg_price <= 0.0 {
            return 0.0;
        }
        (total_miles / self.config.assumed_mpg) * avg_price
    }

    /// $/gal saved at `station` versus the route average, when priced.
    pub fn savings(&self, station: &FuelStation, avg_price: f64) -> Option<f64> {
        station.diesel_price.map(|p| (avg_price - p).max(0.0))
    }

    /// Rank up to the 5 cheapest stations into low-urgency suggestions.
    ///
    /// `stations` is expected sorted cheapest-first (catalog order). With a
    /// driver position, `distance_from_route` is replaced by the true
    /// driver-to-station distance.
    pub fn generate_suggestions(
        &self,
        stations: &[FuelStation],
        avg_price: f64,
        driver: Option<Coordinate>,
    ) -> Vec<FuelSuggestion> {
        stations
            .iter()
            .take(5)
            .map(|station| {
                let mut station = station.clone();
                let savings = self.savings(&station, avg_price);
                let mut reason = match station.diesel_price {
                    Some(price) => format!("Diesel ${price:.2}/gal"),
                    None => "Diesel price unavailable".to_string(),
                };
                if let Some(saved) = savings.filter(|s| *s > 0.0) {
                    reason.push_str(&format!(", save ${saved:.2}/gal vs route avg"));
                }
                if let Some(pos) = driver {
                    station.distance_from_route = Some(geo::distance_miles(
                        pos,
                        Coordinate::new(station.lat, station.lng),
                    ));
                }
                FuelSuggestion {
                    station,
                    urgency: Urgency::Low,
                    reason,
                    estimated_savings: savings,
                }
            })
            .collect()
    }

    /// Tiered escalation: High for low fuel, Medium for worthwhile nearby
    /// savings, Low as the fallback ranking. Each urgency appears at most
    /// once and ordering is always High before Medium before Low. Urgency
    /// tracks fuel risk; price opportunity alone never outranks it.
    pub fn smart_suggestions(
        &self,
        stations: &[FuelStation],
        avg_price: f64,
        driver: Coordinate,
        fuel_percent: Option<f64>,
    ) -> Vec<FuelSuggestion> {
        let mut suggestions = Vec::new();

        // High urgency: tank is low, nearest station wins regardless of price.
        if let Some(pct) = fuel_percent.filter(|p| *p < self.config.low_fuel_threshold_pct) {
            if let Some(nearest) = self.nearest_station(stations, driver) {
                let distance = nearest.distance_from_route.unwrap_or(0.0);
                suggestions.push(FuelSuggestion {
                    reason: format!(
                        "Low fuel ({pct}%)! {} is {distance:.1} mi away",
                        nearest.name
                    ),
                    estimated_savings: self.savings(&nearest, avg_price),
                    station: nearest,
                    urgency: Urgency::High,
                });
            }
        }

        // Medium urgency: meaningful savings within reach of the driver.
        let fuel_allows_detour = fuel_percent
            .map(|p| p < self.config.medium_fuel_threshold_pct)
            .unwrap_or(true);
        if fuel_allows_detour {
            let cheap_nearby = stations.iter().find(|s| {
                let Some(price) = s.diesel_price else {
                    return false;
                };
                let dist = geo::distance_miles(driver, Coordinate::new(s.lat, s.lng));
                dist <= self.config.nearby_radius_miles
                    && price <= avg_price - self.config.price_savings_threshold
            });

            if let Some(station) = cheap_nearby {
                let already = suggestions.iter().any(|s| s.station.id == station.id);
                if !already {
                    let saved = self.savings(station, avg_price).unwrap_or(0.0);
                    suggestions.push(FuelSuggestion {
                        station: station.clone(),
                        urgency: Urgency::Medium,
                        reason: format!("Save ${saved:.2}/gal at {}", station.name),
                        estimated_savings: Some(saved),
                    });
                }
            }
        }

        // Low urgency fallback: best general ranking, only when nothing fired.
        if suggestions.is_empty() {
            suggestions.extend(
                self.generate_suggestions(stations, avg_price, Some(driver))
                    .into_iter()
                    .take(1),
            );
        }

        suggestions
    }

    fn nearest_station(&self, stations: &[FuelStation], driver: Coordinate) -> Option<FuelStation> {
        let mut nearest: Option<FuelStation> = None;
        let mut min_dist = f64::INFINITY;
        for s in stations {
            let dist = geo::distance_miles(driver, Coordinate::new(s.lat, s.lng));
            if dist < min_dist {
                min_dist = dist;
                let mut found = s.clone();
                found.distance_from_route = Some(dist);
                nearest = Some(found);
            }
        }
        nearest
    }
}
