//! Background tracking lifecycle
//!
//! ```text
//!            start_tracking()               registration ok
//!  Stopped ──────────────────▶ Starting ──────────────────▶ Tracking
//!     ▲                           │                            │
//!     │   permission denied or    │                            │
//!     ├───────────────────────────┘                            │
//!     │   registration failed                                  │
//!     └────────────────────────────────────────────────────────┘
//!                         stop_tracking()
//! ```
//!
//! Transitions are serialized: a second `start_tracking` while one is in
//! progress waits for it and then sees `Tracking`.
//!
//! [`TrackingController::follow_settings`] keeps the state in line with the
//! settings store, so switching location or proximity off stops tracking.

use crate::dispatcher::DispatchReport;
use crate::pipeline::ProximityPipeline;
use crate::platform::{LocationService, LocationTaskHandler, LocationUpdateOptions, Notifier};
use crate::settings::LocationSettings;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle state of background tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingState {
    Stopped,
    Starting,
    Tracking,
}

/// Starts and stops background location updates that feed a
/// [`ProximityPipeline`]
pub struct TrackingController {
    task_name: String,
    options: LocationUpdateOptions,
    pipeline: Arc<ProximityPipeline>,
    location: Arc<dyn LocationService>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<TrackingState>,
    transition: tokio::sync::Mutex<()>,
}

impl TrackingController {
    /// Controller registering `pipeline` under `task_name` with default options
    pub fn new(
        task_name: impl Into<String>,
        pipeline: Arc<ProximityPipeline>,
        location: Arc<dyn LocationService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            task_name: task_name.into(),
            options: LocationUpdateOptions::default(),
            pipeline,
            location,
            notifier,
            state: Mutex::new(TrackingState::Stopped),
            transition: tokio::sync::Mutex::new(()),
        }
    }

    /// Use `options` for the background registration
    #[must_use]
    pub fn with_options(mut self, options: LocationUpdateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn state(&self) -> TrackingState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: TrackingState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Begin background tracking.
    ///
    /// Requires both settings switches, then notification permission, then
    /// background location permission. Returns `true` once tracking is
    /// active, including when it already was. Never registers twice.
    pub async fn start_tracking(&self) -> bool {
        let _transition = self.transition.lock().await;

        if self.state() == TrackingState::Tracking {
            if self.registered().await {
                debug!(task = %self.task_name, "Already tracking");
                return true;
            }
            warn!(task = %self.task_name, "Location updates were removed, registering again");
            self.set_state(TrackingState::Stopped);
        }

        let settings = self.pipeline.settings().load().await;
        if !settings.tracking_allowed() {
            debug!(task = %self.task_name, "Tracking not allowed by settings");
            return false;
        }

        self.set_state(TrackingState::Starting);

        if !self.notifier.request_permission().await.is_granted() {
            warn!("Notification permission not granted");
            self.set_state(TrackingState::Stopped);
            return false;
        }

        if !self
            .location
            .request_background_permission()
            .await
            .is_granted()
        {
            warn!("Background location permission not granted");
            self.set_state(TrackingState::Stopped);
            return false;
        }

        if self.registered().await {
            info!(task = %self.task_name, "Location updates already registered");
            self.set_state(TrackingState::Tracking);
            return true;
        }

        let handler: Arc<dyn LocationTaskHandler> = self.pipeline.clone();
        match self
            .location
            .start_location_updates(&self.task_name, &self.options, handler)
            .await
        {
            Ok(()) => {
                info!(
                    task = %self.task_name,
                    radius_m = settings.proximity_distance,
                    "Proximity tracking started"
                );
                self.set_state(TrackingState::Tracking);
                true
            }
            Err(e) => {
                error!(task = %self.task_name, error = %e, "Failed to start location updates");
                self.set_state(TrackingState::Stopped);
                false
            }
        }
    }

    /// Stop background tracking; a no-op when not tracking.
    ///
    /// A delivery already being handled runs to completion.
    pub async fn stop_tracking(&self) {
        let _transition = self.transition.lock().await;

        if self.registered().await {
            match self.location.stop_location_updates(&self.task_name).await {
                Ok(()) => info!(task = %self.task_name, "Proximity tracking stopped"),
                Err(e) => error!(task = %self.task_name, error = %e, "Failed to stop location updates"),
            }
        }

        self.set_state(TrackingState::Stopped);
    }

    async fn registered(&self) -> bool {
        self.location
            .has_started_location_updates(&self.task_name)
            .await
    }

    /// Start or stop tracking to match the persisted settings
    pub async fn sync_with_settings(&self) -> TrackingState {
        let settings = self.pipeline.settings().load().await;
        self.apply_settings(&settings).await
    }

    async fn apply_settings(&self, settings: &LocationSettings) -> TrackingState {
        if settings.tracking_allowed() {
            self.start_tracking().await;
        } else {
            self.stop_tracking().await;
        }
        self.state()
    }

    /// Apply every later settings save, starting or stopping tracking.
    ///
    /// The task ends once the controller is dropped and the next change
    /// arrives, or when the settings store goes away. Abort the handle to
    /// stop following earlier.
    pub fn follow_settings(self: &Arc<Self>) -> JoinHandle<()> {
        let controller = Arc::downgrade(self);
        let mut changes = self.pipeline.settings().subscribe();

        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let settings = *changes.borrow_and_update();
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                let state = controller.apply_settings(&settings).await;
                debug!(task = %controller.task_name, ?state, "Applied settings change");
            }
        })
    }

    /// Run one pass at the current position, outside of background updates.
    ///
    /// Returns an empty report when proximity is off, location permission is
    /// missing or no position is available.
    pub async fn check_proximity_now(&self) -> DispatchReport {
        let settings = self.pipeline.settings().load().await;
        if !settings.tracking_allowed() {
            debug!("Proximity disabled, skipping check");
            return DispatchReport::default();
        }

        if !self
            .location
            .request_foreground_permission()
            .await
            .is_granted()
        {
            warn!("Location permission not granted, skipping check");
            return DispatchReport::default();
        }

        match self.location.current_position(self.options.accuracy).await {
            Ok(fix) => self.pipeline.run(fix.coordinate).await,
            Err(e) => {
                warn!(error = %e, "No current position for proximity check");
                DispatchReport::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ChannelLocationService, LocationFix, LogNotifier, PermissionStatus};
    use crate::test_support::{destination_at, CountingSource, Stores, USER};
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    struct Harness {
        stores: Stores,
        location: Arc<ChannelLocationService>,
        notifier: Arc<LogNotifier>,
        controller: Arc<TrackingController>,
    }

    fn harness_with(
        stores: Stores,
        location: ChannelLocationService,
        notifier: LogNotifier,
    ) -> Harness {
        let location = Arc::new(location);
        let notifier = Arc::new(notifier);
        let source = Arc::new(CountingSource::new(vec![destination_at(7, "Rheinfall", 1500.0)]));
        let pipeline = Arc::new(ProximityPipeline::new(
            stores.settings.clone(),
            stores.notified.clone(),
            source,
            notifier.clone(),
        ));
        let controller = Arc::new(TrackingController::new(
            "proximity-location-tracking",
            pipeline,
            location.clone(),
            notifier.clone(),
        ));
        Harness {
            stores,
            location,
            notifier,
            controller,
        }
    }

    async fn harness() -> Harness {
        harness_with(
            Stores::enabled(2000).await,
            ChannelLocationService::new(),
            LogNotifier::new(),
        )
    }

    #[tokio::test]
    async fn test_start_registers_once() {
        let h = harness().await;

        assert!(h.controller.start_tracking().await);
        assert_eq!(h.controller.state(), TrackingState::Tracking);
        assert!(h.controller.start_tracking().await);
        assert_eq!(h.location.start_calls(), 1);
        assert!(h.location.has_started_location_updates("proximity-location-tracking").await);
    }

    #[tokio::test]
    async fn test_start_registers_again_after_external_stop() {
        let h = harness().await;
        assert!(h.controller.start_tracking().await);

        // The platform dropped the task behind the controller's back
        h.location
            .stop_location_updates("proximity-location-tracking")
            .await
            .unwrap();
        assert_eq!(h.controller.state(), TrackingState::Tracking);

        assert!(h.controller.start_tracking().await);
        assert_eq!(h.controller.state(), TrackingState::Tracking);
        assert!(h.location.has_started_location_updates("proximity-location-tracking").await);
        assert_eq!(h.location.start_calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_starts_register_once() {
        let h = harness().await;
        let (a, b) = tokio::join!(h.controller.start_tracking(), h.controller.start_tracking());
        assert!(a && b);
        assert_eq!(h.location.start_calls(), 1);
    }

    #[tokio::test]
    async fn test_start_refused_by_settings() {
        let h = harness_with(Stores::new(), ChannelLocationService::new(), LogNotifier::new());
        assert!(!h.controller.start_tracking().await);
        assert_eq!(h.controller.state(), TrackingState::Stopped);
        assert_eq!(h.location.start_calls(), 0);
    }

    #[tokio::test]
    async fn test_notification_permission_denied() {
        let h = harness_with(
            Stores::enabled(2000).await,
            ChannelLocationService::new(),
            LogNotifier::with_permission(PermissionStatus::Denied),
        );
        assert!(!h.controller.start_tracking().await);
        assert_eq!(h.controller.state(), TrackingState::Stopped);
        assert_eq!(h.location.start_calls(), 0);
    }

    #[tokio::test]
    async fn test_background_permission_denied() {
        let h = harness_with(
            Stores::enabled(2000).await,
            ChannelLocationService::new().with_background_permission(PermissionStatus::Denied),
            LogNotifier::new(),
        );
        assert!(!h.controller.start_tracking().await);
        assert_eq!(h.controller.state(), TrackingState::Stopped);
        assert!(!h.location.has_started_location_updates("proximity-location-tracking").await);
    }

    #[tokio::test]
    async fn test_adopts_existing_registration() {
        let h = harness().await;
        h.controller.start_tracking().await;

        // A fresh controller over the same platform finds the registration.
        let pipeline = Arc::new(ProximityPipeline::new(
            h.stores.settings.clone(),
            h.stores.notified.clone(),
            Arc::new(CountingSource::new(Vec::new())),
            h.notifier.clone(),
        ));
        let other = TrackingController::new(
            "proximity-location-tracking",
            pipeline,
            h.location.clone(),
            h.notifier.clone(),
        );
        assert!(other.start_tracking().await);
        assert_eq!(other.state(), TrackingState::Tracking);
        assert_eq!(h.location.start_calls(), 1);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let h = harness().await;
        h.controller.stop_tracking().await;
        assert_eq!(h.controller.state(), TrackingState::Stopped);

        h.controller.start_tracking().await;
        h.controller.stop_tracking().await;
        h.controller.stop_tracking().await;
        assert_eq!(h.controller.state(), TrackingState::Stopped);
        assert!(!h.location.has_started_location_updates("proximity-location-tracking").await);
    }

    #[tokio::test]
    async fn test_sync_follows_settings() {
        let h = harness().await;
        assert_eq!(h.controller.sync_with_settings().await, TrackingState::Tracking);

        h.stores.settings.set_location_enabled(false).await.unwrap();
        assert_eq!(h.controller.sync_with_settings().await, TrackingState::Stopped);
        assert!(!h.location.has_started_location_updates("proximity-location-tracking").await);
    }

    async fn wait_for_state(controller: &TrackingController, state: TrackingState) {
        timeout(Duration::from_secs(2), async {
            while controller.state() != state {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("state never reached");
    }

    #[tokio::test]
    async fn test_follow_settings_stops_when_location_turned_off() {
        let h = harness().await;
        let follower = h.controller.follow_settings();
        assert!(h.controller.start_tracking().await);

        h.stores.settings.set_location_enabled(false).await.unwrap();

        wait_for_state(&h.controller, TrackingState::Stopped).await;
        assert!(!h.location.has_started_location_updates("proximity-location-tracking").await);
        follower.abort();
    }

    #[tokio::test]
    async fn test_follow_settings_restarts_when_enabled() {
        let h = harness().await;
        let follower = h.controller.follow_settings();
        assert!(h.controller.start_tracking().await);

        h.stores.settings.set_proximity_enabled(false).await.unwrap();
        wait_for_state(&h.controller, TrackingState::Stopped).await;

        h.stores.settings.set_proximity_enabled(true).await.unwrap();
        wait_for_state(&h.controller, TrackingState::Tracking).await;
        assert_eq!(h.location.start_calls(), 2);
        follower.abort();
    }

    #[tokio::test]
    async fn test_background_fix_triggers_notification() {
        let h = harness().await;
        h.controller.start_tracking().await;

        h.location.sender().send_fix(LocationFix::new(USER, 0));

        timeout(Duration::from_secs(2), async {
            while h.notifier.delivered().is_empty() {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no notification delivered");

        let delivered = h.notifier.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].body, "Rheinfall ist nur 1.5km entfernt.");
    }

    #[tokio::test]
    async fn test_check_now_uses_current_position() {
        let h = harness().await;

        // No fix yet
        assert_eq!(h.controller.check_proximity_now().await, DispatchReport::default());

        h.location.sender().send_fix(LocationFix::new(USER, 0));
        let report = h.controller.check_proximity_now().await;
        assert_eq!(report.sent, 1);
        assert_eq!(report.notified_ids, vec![7]);
    }

    #[tokio::test]
    async fn test_check_now_requires_location_permission() {
        let h = harness_with(
            Stores::enabled(2000).await,
            ChannelLocationService::new().with_foreground_permission(PermissionStatus::Denied),
            LogNotifier::new(),
        );
        h.location.sender().send_fix(LocationFix::new(USER, 0));

        assert_eq!(h.controller.check_proximity_now().await, DispatchReport::default());
        assert!(h.notifier.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_check_now_respects_settings() {
        let h = harness().await;
        h.location.sender().send_fix(LocationFix::new(USER, 0));
        h.stores.settings.set_proximity_enabled(false).await.unwrap();

        assert_eq!(h.controller.check_proximity_now().await, DispatchReport::default());
        assert!(h.notifier.delivered().is_empty());
    }
}
