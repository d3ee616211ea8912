//! Great-circle geometry for the search engine.
//!
//! Distances use the haversine formula on a spherical Earth. Containment
//! tests work on central angles so a bounded search never multiplies by the
//! Earth radius at all: a clinic is inside a radius iff its central angle
//! from the center is at most the angular radius.

use crate::constants::{ANGULAR_EARTH_RADIUS_KM, EARTH_RADIUS_KM};
use clindex_types::Coordinates;

/// Central angle in radians between two points, haversine form.
pub fn central_angle(a: Coordinates, b: Coordinates) -> f64 {
    let lat1_rad = a.latitude().to_radians();
    let lat2_rad = b.latitude().to_radians();
    let delta_lat = (b.latitude() - a.latitude()).to_radians();
    let delta_lng = (b.longitude() - a.longitude()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Great-circle distance in kilometres between two points.
///
/// Pure and deterministic; Earth radius 6371 km.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    EARTH_RADIUS_KM * central_angle(a, b)
}

/// Convert a surface radius in kilometres to the angular radius used for
/// spherical containment tests.
pub fn angular_radius(radius_km: f64) -> f64 {
    radius_km / ANGULAR_EARTH_RADIUS_KM
}

/// Round to two decimals, for distance annotations.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal, for average ratings.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
