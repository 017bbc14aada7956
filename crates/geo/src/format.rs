//! Human-readable distance strings.

/// Formats a distance for display in a notification body.
///
/// Below one kilometer the value is rounded to whole meters (`"850m"`),
/// otherwise it is shown in kilometers with one decimal (`"1.5km"`).
///
/// ```
/// assert_eq!(ausflug_geo::format_distance(1500.0), "1.5km");
/// ```
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round() as u64)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meters_below_one_kilometer() {
        assert_eq!(format_distance(0.0), "0m");
        assert_eq!(format_distance(849.6), "850m");
        assert_eq!(format_distance(999.4), "999m");
    }

    #[test]
    fn test_kilometers_from_one_kilometer() {
        assert_eq!(format_distance(1000.0), "1.0km");
        assert_eq!(format_distance(1500.0), "1.5km");
        assert_eq!(format_distance(12_345.0), "12.3km");
    }
}
