//! Great-circle distance between coordinates
//!
//! Callers validate coordinates before calling in; nothing here checks for
//! non-finite input.

use shared::Coordinate;

/// Mean Earth radius used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres. Symmetric, non-negative, and zero for equal points.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}
