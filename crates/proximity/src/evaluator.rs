//! Range filter: which destinations are close enough to announce

use crate::notified::NotifiedStore;
use crate::platform::DestinationSource;
use crate::settings::{LocationSettings, LocationSettingsStore};
use ausflug_api_client::Destination;
use ausflug_geo::{within_radius, Coordinate};
use ausflug_telemetry::{metrics, names};
use std::sync::Arc;
use tracing::{debug, warn};

/// A destination inside the notification radius
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityMatch {
    pub destination: Destination,
    /// Great-circle distance from the user in meters
    pub distance_m: f64,
}

/// Whether `target` lies within the configured radius of `current`.
///
/// False when either position is unknown or proximity is switched off.
#[must_use]
pub fn is_within_proximity(
    current: Option<Coordinate>,
    target: Option<Coordinate>,
    settings: &LocationSettings,
) -> bool {
    match (current, target) {
        (Some(current), Some(target)) if settings.tracking_allowed() => {
            within_radius(&current, &target, settings.radius_m()).is_some()
        }
        _ => false,
    }
}

/// Picks the destinations to announce for a position
pub struct ProximityEvaluator {
    settings: Arc<LocationSettingsStore>,
    notified: Arc<NotifiedStore>,
    destinations: Arc<dyn DestinationSource>,
}

impl ProximityEvaluator {
    pub fn new(
        settings: Arc<LocationSettingsStore>,
        notified: Arc<NotifiedStore>,
        destinations: Arc<dyn DestinationSource>,
    ) -> Self {
        Self {
            settings,
            notified,
            destinations,
        }
    }

    pub fn settings(&self) -> &Arc<LocationSettingsStore> {
        &self.settings
    }

    pub fn notified(&self) -> &Arc<NotifiedStore> {
        &self.notified
    }

    /// Destinations within the radius of `(user_lat, user_lon)` that have
    /// not been announced in the last 24 hours.
    ///
    /// Returns an empty list without touching the backend when either switch
    /// is off. A failed fetch also yields an empty list. Destinations without
    /// parseable coordinates are skipped. The boundary is inclusive.
    pub async fn evaluate(&self, user_lat: f64, user_lon: f64) -> Vec<ProximityMatch> {
        let settings = self.settings.load().await;
        if !settings.tracking_allowed() {
            debug!(
                location_enabled = settings.location_enabled,
                proximity_enabled = settings.proximity_notifications_enabled,
                "Proximity disabled, skipping evaluation"
            );
            return Vec::new();
        }

        let destinations = match self.destinations.all_destinations().await {
            Ok(destinations) => destinations,
            Err(e) => {
                warn!(error = %e, "Failed to fetch destinations");
                metrics().increment(names::DESTINATION_FETCH_FAILED);
                return Vec::new();
            }
        };

        let mut excluded = self.notified.get_notified().await;
        let user = Coordinate::new(user_lat, user_lon);
        let radius_m = settings.radius_m();
        let total = destinations.len();

        let matches: Vec<ProximityMatch> = destinations
            .into_iter()
            .filter_map(|destination| {
                if excluded.contains(&destination.id) {
                    return None;
                }
                let target = Coordinate::from_optional(
                    destination.lat.as_deref(),
                    destination.lng.as_deref(),
                )?;
                let distance_m = within_radius(&user, &target, radius_m)?;
                // A destination listed twice is matched once.
                excluded.insert(destination.id);
                Some(ProximityMatch {
                    destination,
                    distance_m,
                })
            })
            .collect();

        debug!(
            total,
            matched = matches.len(),
            radius_m,
            "Proximity evaluation finished"
        );
        matches
    }

    /// [`ProximityEvaluator::evaluate`] for a coordinate
    pub async fn evaluate_at(&self, user: Coordinate) -> Vec<ProximityMatch> {
        self.evaluate(user.latitude, user.longitude).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{destination_at, north_of, CountingSource, Stores, USER};
    use ausflug_core::kv::KeyValueStore;

    fn evaluator(stores: &Stores, source: Arc<CountingSource>) -> ProximityEvaluator {
        ProximityEvaluator::new(stores.settings.clone(), stores.notified.clone(), source)
    }

    #[tokio::test]
    async fn test_disabled_settings_skip_fetch() {
        let stores = Stores::new();
        let source = Arc::new(CountingSource::new(vec![destination_at(1, "A", 10.0)]));
        let evaluator = evaluator(&stores, source.clone());

        assert!(evaluator.evaluate(USER.latitude, USER.longitude).await.is_empty());

        stores.settings.set_location_enabled(true).await.unwrap();
        assert!(evaluator.evaluate_at(USER).await.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_matches_inside_radius() {
        let stores = Stores::enabled(2000).await;
        let source = Arc::new(CountingSource::new(vec![
            destination_at(1, "Near", 1500.0),
            destination_at(2, "Far", 2500.0),
        ]));
        let matches = evaluator(&stores, source.clone()).evaluate_at(USER).await;

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].destination.id, 1);
        assert!((matches[0].distance_m - 1500.0).abs() < 0.01);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_radius_boundary() {
        let stores = Stores::enabled(1000).await;
        let source = Arc::new(CountingSource::new(vec![
            destination_at(1, "Just inside", 999.999),
            destination_at(2, "Just outside", 1000.001),
        ]));
        let matches = evaluator(&stores, source).evaluate_at(USER).await;

        let ids: Vec<i64> = matches.iter().map(|m| m.destination.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_notified_destinations_excluded() {
        let stores = Stores::enabled(2000).await;
        stores.notified.mark_notified(1).await.unwrap();
        let source = Arc::new(CountingSource::new(vec![
            destination_at(1, "Seen", 100.0),
            destination_at(2, "New", 200.0),
        ]));
        let matches = evaluator(&stores, source).evaluate_at(USER).await;

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].destination.id, 2);
    }

    #[tokio::test]
    async fn test_missing_or_bad_coordinates_skipped() {
        let stores = Stores::enabled(10_000).await;
        let source = Arc::new(CountingSource::new(vec![
            Destination::new(1, "No coords", None, None),
            Destination::new(2, "Half", Some("47.0"), None),
            Destination::new(3, "Garbage", Some("abc"), Some("8.0")),
            Destination::new(4, "Empty", Some(""), Some("")),
            destination_at(5, "Good", 50.0),
        ]));
        let matches = evaluator(&stores, source).evaluate_at(USER).await;

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].destination.id, 5);
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty() {
        let stores = Stores::enabled(2000).await;
        let source = Arc::new(CountingSource::failing());
        assert!(evaluator(&stores, source.clone()).evaluate_at(USER).await.is_empty());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_ids_matched_once() {
        let stores = Stores::enabled(2000).await;
        let source = Arc::new(CountingSource::new(vec![
            destination_at(1, "Twice", 100.0),
            destination_at(1, "Twice", 100.0),
        ]));
        assert_eq!(evaluator(&stores, source).evaluate_at(USER).await.len(), 1);
    }

    #[tokio::test]
    async fn test_evaluate_does_not_write() {
        let stores = Stores::enabled(2000).await;
        let source = Arc::new(CountingSource::new(vec![destination_at(1, "A", 10.0)]));
        evaluator(&stores, source).evaluate_at(USER).await;

        let ledger = stores
            .backend
            .get_item(crate::notified::NOTIFIED_TRIPS_KEY)
            .await
            .unwrap();
        assert!(ledger.is_none());
    }

    #[test]
    fn test_is_within_proximity_requires_positions_and_switches() {
        let on = LocationSettings {
            location_enabled: true,
            proximity_notifications_enabled: true,
            ..LocationSettings::default()
        };
        let near = Some(north_of(USER, 100.0));

        assert!(is_within_proximity(Some(USER), near, &on));
        assert!(!is_within_proximity(None, near, &on));
        assert!(!is_within_proximity(Some(USER), None, &on));
        assert!(!is_within_proximity(Some(USER), near, &LocationSettings::default()));
        assert!(!is_within_proximity(Some(USER), Some(north_of(USER, 5000.0)), &on));
    }
}
