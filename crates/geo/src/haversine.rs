//! Haversine distance calculation.
//!
//! The Haversine formula calculates the great-circle distance between two points
//! on a sphere given their longitudes and latitudes.

use crate::Coordinate;

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculates the great-circle distance between two coordinates in kilometers.
///
/// # Example
/// ```
/// use ausflug_geo::{haversine_distance, Coordinate};
///
/// let zurich = Coordinate::new(47.3769, 8.5417);
/// let bern = Coordinate::new(46.9480, 7.4474);
///
/// let distance = haversine_distance(&zurich, &bern);
/// assert!((distance - 95.0).abs() < 5.0);
/// ```
#[inline]
pub fn haversine_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    haversine_distance_with_radius(from, to, EARTH_RADIUS_KM)
}

/// Calculates the great-circle distance between two coordinates in meters.
///
/// The result is never negative, is zero for identical points and is
/// symmetric in its arguments.
#[inline]
pub fn haversine_distance_meters(from: &Coordinate, to: &Coordinate) -> f64 {
    haversine_distance_with_radius(from, to, EARTH_RADIUS_M)
}

/// Scalar form of [`haversine_distance_meters`].
///
/// ```
/// let d = ausflug_geo::distance(47.3769, 8.5417, 47.3769, 8.5417);
/// assert_eq!(d, 0.0);
/// ```
#[inline]
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine_distance_meters(&Coordinate::new(lat1, lon1), &Coordinate::new(lat2, lon2))
}

/// Returns the distance in meters if `to` lies within `radius_m` of `from`.
///
/// The boundary is inclusive: a point exactly `radius_m` away matches.
#[inline]
pub fn within_radius(from: &Coordinate, to: &Coordinate, radius_m: f64) -> Option<f64> {
    let meters = haversine_distance_meters(from, to);
    (meters <= radius_m).then_some(meters)
}

#[inline]
fn haversine_distance_with_radius(from: &Coordinate, to: &Coordinate, radius: f64) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair outside [0, 1] for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    radius * c
}

/// Fast approximate distance for filtering (uses equirectangular projection).
///
/// Less accurate than Haversine over long distances. Returns kilometers.
#[inline]
pub fn approximate_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let x = (lon2 - lon1) * ((lat1 + lat2) / 2.0).cos();
    let y = lat2 - lat1;

    (x * x + y * y).sqrt() * EARTH_RADIUS_KM
}
