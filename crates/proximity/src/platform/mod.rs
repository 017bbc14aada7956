//! Device and backend seams
//!
//! The pipeline only talks to the outside world through these traits:
//! - [`DestinationSource`]: the destination catalog
//! - [`LocationService`]: permissions, one-shot fixes, background updates
//! - [`Notifier`]: local notifications
//!
//! In-process implementations live alongside: [`ChannelLocationService`]
//! feeds fixes from a channel and [`LogNotifier`] records notifications and
//! logs them.

mod channel;
mod log_notifier;
mod supabase;

pub use channel::{ChannelLocationService, FixSender};
pub use log_notifier::LogNotifier;

use crate::error::Result;
use ausflug_api_client::Destination;
use ausflug_core::config::{AppConfig, ForegroundServiceConfig, LocationAccuracy};
use ausflug_geo::Coordinate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

impl PermissionStatus {
    /// Only `Granted` counts
    #[must_use]
    pub fn is_granted(self) -> bool {
        self == PermissionStatus::Granted
    }
}

/// A single position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    /// Horizontal accuracy radius in meters, if known
    pub accuracy_m: Option<f64>,
    /// Epoch milliseconds when the fix was taken
    pub timestamp_ms: i64,
}

impl LocationFix {
    pub fn new(coordinate: Coordinate, timestamp_ms: i64) -> Self {
        Self {
            coordinate,
            accuracy_m: None,
            timestamp_ms,
        }
    }
}

/// What a background registration delivers: a batch of fixes or an error
#[derive(Debug, Clone, PartialEq)]
pub enum LocationDelivery {
    Fixes(Vec<LocationFix>),
    Error(String),
}

/// Options for a background location registration
#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdateOptions {
    pub accuracy: LocationAccuracy,
    /// Deliver at most this often...
    pub time_interval: Duration,
    /// ...unless the device moved at least this far (meters)
    pub distance_interval_m: u32,
    pub shows_background_indicator: bool,
    pub foreground_service: ForegroundServiceConfig,
}

impl Default for LocationUpdateOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for LocationUpdateOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            accuracy: config.tracking.accuracy,
            time_interval: config.tracking.time_interval(),
            distance_interval_m: config.tracking.distance_interval_m,
            shows_background_indicator: config.tracking.shows_background_indicator,
            foreground_service: config.foreground_service.clone(),
        }
    }
}

/// How a notification is presented while the app is in the foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPresentation {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

impl Default for NotificationPresentation {
    fn default() -> Self {
        Self {
            show_alert: true,
            play_sound: true,
            set_badge: false,
        }
    }
}

/// An immediate local notification about a nearby destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityNotification {
    pub title: String,
    pub body: String,
    /// Payload handed back on tap, `{"tripId": <id>}`
    pub data: serde_json::Value,
    pub presentation: NotificationPresentation,
}

/// Catalog of destinations to test against
#[async_trait]
pub trait DestinationSource: Send + Sync {
    /// Every destination, with or without coordinates
    async fn all_destinations(&self) -> Result<Vec<Destination>>;
}

/// Receives background location deliveries
#[async_trait]
pub trait LocationTaskHandler: Send + Sync {
    async fn on_location_update(&self, delivery: LocationDelivery);
}

/// Device positioning
#[async_trait]
pub trait LocationService: Send + Sync {
    /// One-shot fix
    async fn current_position(&self, accuracy: LocationAccuracy) -> Result<LocationFix>;

    /// Ask for "while in use" location access
    async fn request_foreground_permission(&self) -> PermissionStatus;

    /// Ask for "always" location access
    async fn request_background_permission(&self) -> PermissionStatus;

    /// Whether a registration named `task_name` is active
    async fn has_started_location_updates(&self, task_name: &str) -> bool;

    /// Register `handler` for background deliveries under `task_name`
    async fn start_location_updates(
        &self,
        task_name: &str,
        options: &LocationUpdateOptions,
        handler: Arc<dyn LocationTaskHandler>,
    ) -> Result<()>;

    /// Remove the registration; a delivery already being handled completes
    async fn stop_location_updates(&self, task_name: &str) -> Result<()>;
}

/// Local notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ask for permission to post notifications
    async fn request_permission(&self) -> PermissionStatus;

    /// Show `notification` now; returns the platform notification id
    async fn schedule_immediate(&self, notification: &ProximityNotification) -> Result<String>;

    /// Withdraw every pending and delivered notification
    async fn cancel_all(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let options = LocationUpdateOptions::default();
        assert_eq!(options.accuracy, LocationAccuracy::Balanced);
        assert_eq!(options.time_interval, Duration::from_secs(60));
        assert_eq!(options.distance_interval_m, 100);
        assert!(options.shows_background_indicator);
        assert_eq!(options.foreground_service.title, "AusflugFinder");
    }

    #[test]
    fn test_presentation_defaults() {
        let presentation = NotificationPresentation::default();
        assert!(presentation.show_alert);
        assert!(presentation.play_sound);
        assert!(!presentation.set_badge);
    }

    #[test]
    fn test_permission_status() {
        assert!(PermissionStatus::Granted.is_granted());
        assert!(!PermissionStatus::Undetermined.is_granted());
    }
}
