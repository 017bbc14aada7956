//! Geospatial helpers for AusflugFinder proximity checks.
//!
//! This crate provides:
//! - Haversine distance calculations (meters and kilometers)
//! - Lenient parsing of the string coordinates stored on destinations
//! - Human-readable distance formatting for notifications
//!
//! # Example
//!
//! ```
//! use ausflug_geo::{haversine_distance_meters, Coordinate};
//!
//! let zurich = Coordinate::new(47.3769, 8.5417);
//! let geneva = Coordinate::new(46.2044, 6.1432);
//!
//! let meters = haversine_distance_meters(&zurich, &geneva);
//! assert!(meters > 218_000.0 && meters < 220_000.0);
//! ```

mod error;
mod format;
mod haversine;

pub use error::{GeoError, GeoErrorCode, Result};
pub use format::format_distance;
pub use haversine::{
    approximate_distance, distance, haversine_distance, haversine_distance_meters, within_radius,
    EARTH_RADIUS_KM, EARTH_RADIUS_M,
};

/// A geographic coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Parses a coordinate from the textual columns used by the `ausfluege` table.
    ///
    /// Returns `None` when either side is empty, unparseable or not finite.
    /// Such rows count as "no location" and are never matched.
    pub fn parse(latitude: &str, longitude: &str) -> Option<Self> {
        Self::try_parse(latitude, longitude).ok()
    }

    /// Like [`Coordinate::parse`] but reports why parsing failed.
    pub fn try_parse(latitude: &str, longitude: &str) -> Result<Self> {
        let latitude = parse_component("latitude", latitude)?;
        let longitude = parse_component("longitude", longitude)?;
        Ok(Self::new(latitude, longitude))
    }

    /// Parses a coordinate from optional columns; any missing side yields `None`.
    pub fn from_optional(latitude: Option<&str>, longitude: Option<&str>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Self::parse(lat, lng),
            _ => None,
        }
    }

    /// Returns true if the coordinate has valid values.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(&self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

fn parse_component(field: &'static str, raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GeoError::MissingComponent(field));
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| GeoError::InvalidCoordinate(format!("{field} is not a number: {trimmed:?}")))?;

    if !value.is_finite() {
        return Err(GeoError::InvalidCoordinate(format!("{field} is not finite: {trimmed:?}")));
    }

    Ok(value)
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_creation() {
        let coord = Coordinate::new(47.3769, 8.5417);
        assert_eq!(coord.latitude, 47.3769);
        assert_eq!(coord.longitude, 8.5417);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
    }

    #[test]
    fn test_parse_database_strings() {
        let coord = Coordinate::parse("46.9480", " 7.4474 ").unwrap();
        assert_eq!(coord, Coordinate::new(46.9480, 7.4474));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Coordinate::parse("", "8.0").is_none());
        assert!(Coordinate::parse("47.0", "abc").is_none());
        assert!(Coordinate::parse("NaN", "8.0").is_none());
        assert!(Coordinate::parse("47.0", "inf").is_none());
    }

    #[test]
    fn test_try_parse_reports_component() {
        let err = Coordinate::try_parse("  ", "8.0").unwrap_err();
        assert_eq!(err.code(), GeoErrorCode::MissingComponent);
        assert!(err.to_string().contains("latitude"));
    }

    #[test]
    fn test_from_optional() {
        assert!(Coordinate::from_optional(None, Some("8.0")).is_none());
        assert!(Coordinate::from_optional(Some("47.0"), None).is_none());
        assert_eq!(
            Coordinate::from_optional(Some("47.0"), Some("8.0")),
            Some(Coordinate::new(47.0, 8.0))
        );
    }

    #[test]
    fn test_coordinate_from_tuple() {
        let coord: Coordinate = (47.3769, 8.5417).into();
        assert_eq!(coord.latitude, 47.3769);
    }
}
