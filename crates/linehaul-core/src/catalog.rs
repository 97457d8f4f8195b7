//! Station deduplication across overlapping route samples.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::FuelStation;

/// Collapse stations discovered by multiple overlapping samples.
///
/// Groups by station id and keeps the entry with the lowest known diesel
/// price (a priced entry always beats an unpriced one). Output is sorted
/// ascending by price with unpriced stations last.
pub fn dedupe_stations(stations: Vec<FuelStation>) -> Vec<FuelStation> {
    let mut by_id: HashMap<String, FuelStation> = HashMap::new();

    for station in stations {
        match by_id.get(&station.id) {
            Some(existing) if !is_cheaper(&station, existing) => {}
            _ => {
                by_id.insert(station.id.clone(), station);
            }
        }
    }

    let mut out: Vec<FuelStation> = by_id.into_values().collect();
    out.sort_by(|a, b| cmp_price(a.diesel_price, b.diesel_price));
    out
}

fn is_cheaper(candidate: &FuelStation, existing: &FuelStation) -> bool {
    match (candidate.diesel_price, existing.diesel_price) {
        (Some(c), Some(e)) => c < e,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Missing prices order as +infinity.
fn cmp_price(a: Option<f64>, b: Option<f64>) -> Ordering {
    let a = a.unwrap_or(f64::INFINITY);
    let b = b.unwrap_or(f64::INFINITY);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
