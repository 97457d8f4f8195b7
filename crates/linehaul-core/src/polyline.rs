//! Encoded-polyline codec.
//!
//! The standard signed-delta, base-32 varint encoding at 1e-5 degree
//! precision used by mapping providers for route geometry.

use crate::models::Coordinate;

const PRECISION: f64 = 1e5;

/// Decode an encoded polyline into coordinates.
///
/// Empty or malformed input decodes to an empty vec rather than an error;
/// callers treat an empty result as "no route geometry available" and fall
/// back to other coordinate sources.
pub fn decode(encoded: &str) -> Vec<Coordinate> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0usize;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let Some(dlat) = decode_value(bytes, &mut index) else {
            return Vec::new();
        };
        let Some(dlng) = decode_value(bytes, &mut index) else {
            return Vec::new();
        };
        lat += dlat;
        lng += dlng;
        points.push(Coordinate::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    points
}

/// Encode coordinates into a polyline string. Inverse of [`decode`]:
/// `decode(encode(points))` reproduces `points` to within 1e-5 per axis.
pub fn encode(points: &[Coordinate]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.lat * PRECISION).round() as i64;
        let lng = (point.lng * PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

/// Read one zigzag-encoded varint delta. None on truncated or out-of-range
/// input.
fn decode_value(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut shift = 0u32;
    let mut result: i64 = 0;

    loop {
        let byte = *bytes.get(*index)?;
        if byte < 63 || shift > 30 {
            return None;
        }
        *index += 1;
        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    if result & 1 == 1 {
        Some(!(result >> 1))
    } else {
        Some(result >> 1)
    }
}

fn encode_value(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= 0x20 {
        out.push((((0x20 | (v & 0x1f)) + 63) as u8) as char);
        v >>= 5;
    }
    out.push(((v + 63) as u8) as char);
}
