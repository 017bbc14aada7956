//! Shared fixtures for unit tests

use crate::clock::ManualClock;
use crate::error::{ProximityError, Result};
use crate::notified::NotifiedStore;
use crate::platform::DestinationSource;
use crate::settings::LocationSettingsStore;
use ausflug_api_client::Destination;
use ausflug_core::kv::MemoryStore;
use ausflug_geo::{Coordinate, EARTH_RADIUS_M};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const T0: i64 = 1_700_000_000_000;

pub const USER: Coordinate = Coordinate {
    latitude: 47.0,
    longitude: 8.0,
};

/// Point `meters` due north of `from`
pub fn north_of(from: Coordinate, meters: f64) -> Coordinate {
    Coordinate::new(from.latitude + (meters / EARTH_RADIUS_M).to_degrees(), from.longitude)
}

/// Destination placed `meters` north of [`USER`]
pub fn destination_at(id: i64, name: &str, meters: f64) -> Destination {
    let at = north_of(USER, meters);
    Destination::new(
        id,
        name,
        Some(&at.latitude.to_string()),
        Some(&at.longitude.to_string()),
    )
}

/// Destination source returning a fixed list and counting calls
pub struct CountingSource {
    destinations: Option<Vec<Destination>>,
    calls: AtomicUsize,
}

impl CountingSource {
    pub fn new(destinations: Vec<Destination>) -> Self {
        Self {
            destinations: Some(destinations),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            destinations: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DestinationSource for CountingSource {
    async fn all_destinations(&self) -> Result<Vec<Destination>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.destinations
            .clone()
            .ok_or_else(|| ProximityError::Platform("backend unavailable".into()))
    }
}

/// Stores sharing one in-memory backend and a manual clock at [`T0`]
pub struct Stores {
    pub backend: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub settings: Arc<LocationSettingsStore>,
    pub notified: Arc<NotifiedStore>,
}

impl Stores {
    pub fn new() -> Self {
        let backend = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(T0));
        Self {
            settings: Arc::new(LocationSettingsStore::new(backend.clone())),
            notified: Arc::new(NotifiedStore::new(backend.clone(), clock.clone())),
            backend,
            clock,
        }
    }

    /// Stores with both switches on and the given radius
    pub async fn enabled(radius_m: u32) -> Self {
        let stores = Self::new();
        stores.settings.set_location_enabled(true).await.unwrap();
        stores.settings.set_proximity_enabled(true).await.unwrap();
        stores.settings.set_proximity_distance(radius_m).await.unwrap();
        stores
    }
}
