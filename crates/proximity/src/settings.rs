//! User location preferences
//!
//! Persisted as a single camelCase JSON blob under [`LOCATION_SETTINGS_KEY`].
//! Reads never fail: a missing, unreadable or corrupt blob yields
//! [`LocationSettings::default`], and a partial blob is merged over the
//! defaults key by key.
//!
//! Proximity notifications may only be on while location is on. The rule is
//! enforced by the mutators here, not by the data type.

use crate::error::Result;
use crate::platform::LocationService;
use ausflug_core::kv::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Storage key for the settings blob
pub const LOCATION_SETTINGS_KEY: &str = "location_settings";

/// Radii offered by the settings screen, in meters
pub const DISTANCE_OPTIONS: [u32; 5] = [500, 1000, 2000, 5000, 10000];

/// Default notification radius in meters
pub const DEFAULT_PROXIMITY_DISTANCE: u32 = 2000;

/// Current layout version written by [`LocationSettingsStore::save`]
pub const SETTINGS_VERSION: u32 = 1;

/// Location and proximity preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSettings {
    /// Layout version of the persisted blob
    pub version: u32,
    /// Master switch for location features
    pub location_enabled: bool,
    /// Proximity notifications switch
    pub proximity_notifications_enabled: bool,
    /// Notification radius in meters
    pub proximity_distance: u32,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            location_enabled: false,
            proximity_notifications_enabled: false,
            proximity_distance: DEFAULT_PROXIMITY_DISTANCE,
        }
    }
}

impl LocationSettings {
    /// Both switches are on
    #[must_use]
    pub fn tracking_allowed(&self) -> bool {
        self.location_enabled && self.proximity_notifications_enabled
    }

    /// Radius as meters for distance comparisons
    #[must_use]
    pub fn radius_m(&self) -> f64 {
        f64::from(self.proximity_distance)
    }

    /// Build settings from a persisted blob, upgrading older layouts.
    ///
    /// Blobs written before versioning carry no `version` field and may
    /// miss any key. Keys are read one by one so a single bad value does
    /// not discard the others.
    fn from_stored(value: &Value) -> Self {
        let defaults = Self::default();
        let version = value
            .get("version")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if version > u64::from(SETTINGS_VERSION) {
            warn!(version, "Location settings written by a newer version, reading known keys");
        }

        let location_enabled = value
            .get("locationEnabled")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.location_enabled);
        let proximity_notifications_enabled = value
            .get("proximityNotificationsEnabled")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.proximity_notifications_enabled);
        let proximity_distance = value
            .get("proximityDistance")
            .and_then(distance_from_json)
            .unwrap_or(defaults.proximity_distance);

        Self {
            version: SETTINGS_VERSION,
            location_enabled,
            // Unversioned blobs could hold proximity on with location off.
            proximity_notifications_enabled: location_enabled && proximity_notifications_enabled,
            proximity_distance,
        }
    }
}

fn distance_from_json(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 && f <= f64::from(u32::MAX) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(f.round() as u32)
    } else {
        None
    }
}

/// Read/write access to [`LocationSettings`]
///
/// Each mutator loads the current blob, applies the change and writes the
/// whole blob back. Concurrent mutators are last-writer-wins. Every
/// successful save is published to receivers from
/// [`LocationSettingsStore::subscribe`].
#[derive(Clone)]
pub struct LocationSettingsStore {
    store: Arc<dyn KeyValueStore>,
    changes: Arc<watch::Sender<LocationSettings>>,
}

impl std::fmt::Debug for LocationSettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationSettingsStore").finish_non_exhaustive()
    }
}

impl LocationSettingsStore {
    /// Create a settings store over a key-value backend
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (changes, _) = watch::channel(LocationSettings::default());
        Self {
            store,
            changes: Arc::new(changes),
        }
    }

    /// Receiver notified with the settings written by each later save
    pub fn subscribe(&self) -> watch::Receiver<LocationSettings> {
        self.changes.subscribe()
    }

    /// Load settings; never fails
    pub async fn load(&self) -> LocationSettings {
        let raw = match self.store.get_item(LOCATION_SETTINGS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return LocationSettings::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read location settings, using defaults");
                return LocationSettings::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) if value.is_object() => LocationSettings::from_stored(&value),
            Ok(_) => {
                warn!("Location settings blob is not an object, using defaults");
                LocationSettings::default()
            }
            Err(e) => {
                warn!(error = %e, "Corrupt location settings, using defaults");
                LocationSettings::default()
            }
        }
    }

    /// Persist the full settings blob
    pub async fn save(&self, settings: &LocationSettings) -> Result<()> {
        let settings = LocationSettings {
            version: SETTINGS_VERSION,
            ..*settings
        };
        let json = serde_json::to_string(&settings)?;
        self.store.set_item(LOCATION_SETTINGS_KEY, &json).await?;
        debug!(?settings, "Saved location settings");
        self.changes.send_replace(settings);
        Ok(())
    }

    /// Toggle the location master switch.
    ///
    /// Turning location off also turns proximity notifications off.
    pub async fn set_location_enabled(&self, enabled: bool) -> Result<LocationSettings> {
        let mut settings = self.load().await;
        settings.location_enabled = enabled;
        if !enabled {
            settings.proximity_notifications_enabled = false;
        }
        self.save(&settings).await?;
        info!(enabled, "Location enabled changed");
        Ok(settings)
    }

    /// Turn location on after asking `location` for foreground permission.
    ///
    /// Returns `Ok(false)` without persisting anything when permission is
    /// not granted.
    pub async fn enable_location(&self, location: &dyn LocationService) -> Result<bool> {
        if !location.request_foreground_permission().await.is_granted() {
            warn!("Location permission not granted, leaving location off");
            return Ok(false);
        }
        self.set_location_enabled(true).await?;
        Ok(true)
    }

    /// Toggle proximity notifications.
    ///
    /// Returns `Ok(false)` without persisting anything when asked to enable
    /// while location is disabled.
    pub async fn set_proximity_enabled(&self, enabled: bool) -> Result<bool> {
        let mut settings = self.load().await;
        if enabled && !settings.location_enabled {
            warn!("Refusing to enable proximity notifications while location is disabled");
            return Ok(false);
        }
        settings.proximity_notifications_enabled = enabled;
        self.save(&settings).await?;
        info!(enabled, "Proximity notifications changed");
        Ok(true)
    }

    /// Set the notification radius in meters.
    ///
    /// Any value is stored; [`DISTANCE_OPTIONS`] is only what the UI offers.
    pub async fn set_proximity_distance(&self, meters: u32) -> Result<LocationSettings> {
        let mut settings = self.load().await;
        settings.proximity_distance = meters;
        self.save(&settings).await?;
        info!(meters, "Proximity distance changed");
        Ok(settings)
    }
}
