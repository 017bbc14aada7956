//! Proximity notifications for AusflugFinder
//!
//! Watches the device position and raises a local notification when the
//! user comes within a configured radius of an excursion destination. A
//! destination is announced at most once per 24 hours.
//!
//! The pipeline, leaf-first:
//!
//! | Stage | Type |
//! |-------|------|
//! | User preferences | [`LocationSettingsStore`] |
//! | 24h deduplication ledger | [`NotifiedStore`] |
//! | Range filter | [`ProximityEvaluator`] |
//! | Notification fan-out | [`NotificationDispatcher`] |
//! | Evaluate then dispatch | [`ProximityPipeline`] |
//! | Start/stop background fixes | [`TrackingController`] |
//!
//! Everything that touches the device (position, permissions, notifications,
//! storage, the backend) sits behind the traits in [`platform`], so the
//! pipeline runs the same in a background callback, a foreground check, or a
//! test.
//!
//! # Example
//!
//! ```rust,ignore
//! use ausflug_proximity::prelude::*;
//!
//! let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(data_dir)?);
//! let settings = Arc::new(LocationSettingsStore::new(store.clone()));
//! let notified = Arc::new(NotifiedStore::new(store, Arc::new(SystemClock)));
//! let pipeline = Arc::new(ProximityPipeline::new(settings, notified, destinations, notifier.clone()));
//!
//! let controller = TrackingController::new("proximity-location-tracking", pipeline, location, notifier);
//! controller.sync_with_settings().await;
//! controller.check_proximity_now().await;
//! ```

pub mod clock;
pub mod dispatcher;
pub mod error;
pub mod evaluator;
pub mod notified;
pub mod pipeline;
pub mod platform;
pub mod routing;
pub mod settings;
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use error::{ProximityError, ProximityErrorCode, Result};
pub use evaluator::{is_within_proximity, ProximityEvaluator, ProximityMatch};
pub use notified::{NotifiedStore, NOTIFICATION_TTL, NOTIFIED_TRIPS_KEY};
pub use pipeline::ProximityPipeline;
pub use routing::route_for_notification;
pub use settings::{LocationSettings, LocationSettingsStore, DISTANCE_OPTIONS, LOCATION_SETTINGS_KEY};
pub use tracker::{TrackingController, TrackingState};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::dispatcher::{DispatchReport, NotificationDispatcher};
    pub use crate::evaluator::{ProximityEvaluator, ProximityMatch};
    pub use crate::notified::NotifiedStore;
    pub use crate::pipeline::ProximityPipeline;
    pub use crate::platform::{
        ChannelLocationService, DestinationSource, LocationDelivery, LocationFix,
        LocationService, LocationTaskHandler, LocationUpdateOptions, LogNotifier, Notifier,
        PermissionStatus, ProximityNotification,
    };
    pub use crate::settings::{LocationSettings, LocationSettingsStore};
    pub use crate::tracker::{TrackingController, TrackingState};
    pub use ausflug_core::kv::{FileStore, KeyValueStore, MemoryStore};
    pub use std::sync::Arc;
}
