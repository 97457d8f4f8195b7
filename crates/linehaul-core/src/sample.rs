//! Distance-accumulated sampling along a route path.

use crate::geo;
use crate::models::{Coordinate, SamplePoint};

/// Minimum leftover distance (miles) before the path's final point is
/// emitted as an extra sample.
const FINAL_SAMPLE_MIN_MILES: f64 = 10.0;

/// Walk `path` and emit a sample every `interval_miles`, linearly
/// interpolated within the segment each interval boundary falls on.
///
/// The first path point is always emitted at mile 0. After the walk, the
/// final path point is appended as one more sample when it sits more than
/// [`FINAL_SAMPLE_MIN_MILES`] past the last emitted sample. An empty path
/// yields no samples; a single-point path or a non-positive interval yields
/// just the mile-0 sample.
pub fn sample_points(path: &[Coordinate], interval_miles: f64) -> Vec<SamplePoint> {
    let Some(first) = path.first() else {
        return Vec::new();
    };

    let mut samples = vec![SamplePoint {
        lat: first.lat,
        lng: first.lng,
        miles_from_start: 0.0,
    }];

    // A non-positive interval would never advance past the start.
    if interval_miles <= 0.0 {
        return samples;
    }

    let mut accumulated = 0.0;
    let mut next_sample_at = interval_miles;

    for pair in path.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let segment_miles = geo::distance_miles(prev, curr);
        accumulated += segment_miles;

        // A long segment can cross several interval boundaries.
        while accumulated >= next_sample_at {
            let overshoot = accumulated - next_sample_at;
            let ratio = if segment_miles > 0.0 {
                1.0 - overshoot / segment_miles
            } else {
                1.0
            };
            samples.push(SamplePoint {
                lat: prev.lat + ratio * (curr.lat - prev.lat),
                lng: prev.lng + ratio * (curr.lng - prev.lng),
                miles_from_start: next_sample_at,
            });
            next_sample_at += interval_miles;
        }
    }

    let last_sample_mile = samples.last().map(|s| s.miles_from_start).unwrap_or(0.0);
    if accumulated - last_sample_mile > FINAL_SAMPLE_MIN_MILES {
        let end = path[path.len() - 1];
        samples.push(SamplePoint {
            lat: end.lat,
            lng: end.lng,
            miles_from_start: accumulated,
        });
    }

    samples
}
