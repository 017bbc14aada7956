//! Configuration schema definitions
//!
//! Every section and field has a serde default so a partial (or absent)
//! `ausflug.toml` always yields a complete configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    /// Background location tracking options
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Persistent indicator shown while tracking in the background
    #[serde(default)]
    pub foreground_service: ForegroundServiceConfig,

    /// Local persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Requested accuracy for location fixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationAccuracy {
    /// Coarse, lowest power
    Low,
    /// Roughly 100 m, the default for proximity checks
    #[default]
    Balanced,
    /// Best available accuracy
    High,
}

/// Background tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackingConfig {
    /// Name the platform registration is keyed by
    #[serde(default = "default_task_name")]
    pub task_name: String,

    /// Minimum time between delivered fixes
    #[serde(default = "default_time_interval_secs")]
    pub time_interval_secs: u64,

    /// Minimum displacement between delivered fixes, in meters
    #[serde(default = "default_distance_interval_m")]
    pub distance_interval_m: u32,

    /// Requested fix accuracy
    #[serde(default)]
    pub accuracy: LocationAccuracy,

    /// Show the OS background-location indicator (iOS blue bar)
    #[serde(default = "default_true")]
    pub shows_background_indicator: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            task_name: default_task_name(),
            time_interval_secs: default_time_interval_secs(),
            distance_interval_m: default_distance_interval_m(),
            accuracy: LocationAccuracy::default(),
            shows_background_indicator: true,
        }
    }
}

impl TrackingConfig {
    /// Minimum time interval as a [`Duration`]
    #[must_use]
    pub fn time_interval(&self) -> Duration {
        Duration::from_secs(self.time_interval_secs)
    }
}

fn default_task_name() -> String {
    "proximity-location-tracking".to_string()
}

fn default_time_interval_secs() -> u64 {
    60
}

fn default_distance_interval_m() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

/// Foreground service notification (Android) shown while tracking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForegroundServiceConfig {
    /// Notification title
    #[serde(default = "default_service_title")]
    pub title: String,

    /// Notification body
    #[serde(default = "default_service_body")]
    pub body: String,

    /// Accent color as `#RRGGBB`
    #[serde(default = "default_service_color")]
    pub color: String,
}

impl Default for ForegroundServiceConfig {
    fn default() -> Self {
        Self {
            title: default_service_title(),
            body: default_service_body(),
            color: default_service_color(),
        }
    }
}

fn default_service_title() -> String {
    "AusflugFinder".to_string()
}

fn default_service_body() -> String {
    "Suche nach Ausflugszielen in deiner Nähe".to_string()
}

fn default_service_color() -> String {
    "#22C55E".to_string()
}

/// Local persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StorageConfig {
    /// Directory for persisted key-value blobs (platform data dir if unset)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the data directory, falling back to `<data_dir>/ausflugfinder`
    #[must_use]
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from(".ausflugfinder"))
                .join("ausflugfinder")
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,

    /// Also write daily-rotated log files into this directory
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
