//! 24-hour notification ledger
//!
//! Records when each destination was last announced so the same destination
//! is not announced twice within [`NOTIFICATION_TTL`]. Persisted as a JSON
//! object mapping the destination id (as a string) to epoch milliseconds.
//!
//! Expiry is lazy: stale entries are filtered on read and stay in storage
//! until the next write or [`NotifiedStore::clear`].

use crate::clock::Clock;
use crate::error::Result;
use ausflug_core::kv::KeyValueStore;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Storage key for the ledger
pub const NOTIFIED_TRIPS_KEY: &str = "notified_proximity_trips";

/// How long a destination stays suppressed after being announced
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[allow(clippy::cast_possible_truncation)]
const TTL_MS: i64 = NOTIFICATION_TTL.as_millis() as i64;

/// Persistent set of recently notified destination ids
#[derive(Clone)]
pub struct NotifiedStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for NotifiedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifiedStore")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl NotifiedStore {
    /// Create a ledger over a key-value backend
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Ids announced less than 24 hours ago.
    ///
    /// Never fails; storage or parse errors yield an empty set.
    pub async fn get_notified(&self) -> HashSet<i64> {
        let now = self.clock.now_millis();
        self.entries()
            .await
            .into_iter()
            .filter(|(_, at)| !is_expired(*at, now))
            .map(|(id, _)| id)
            .collect()
    }

    /// Record `id` as announced now.
    ///
    /// Re-reads the persisted map so timestamps of other ids survive,
    /// including expired and unparseable ones.
    pub async fn mark_notified(&self, id: i64) -> Result<()> {
        let mut map = self.read_map().await.unwrap_or_default();
        map.insert(id.to_string(), Value::from(self.clock.now_millis()));

        let json = serde_json::to_string(&map)?;
        self.store.set_item(NOTIFIED_TRIPS_KEY, &json).await?;
        debug!(id, entries = map.len(), "Marked destination as notified");
        Ok(())
    }

    /// Every parseable persisted entry, expired or not, as id to epoch ms
    pub async fn entries(&self) -> BTreeMap<i64, i64> {
        let Some(map) = self.read_map().await else {
            return BTreeMap::new();
        };

        map.iter()
            .filter_map(|(key, value)| {
                let id = key.trim().parse::<i64>().ok()?;
                let at = timestamp_from_json(value)?;
                Some((id, at))
            })
            .collect()
    }

    /// Forget every entry
    pub async fn clear(&self) -> Result<bool> {
        Ok(self.store.remove_item(NOTIFIED_TRIPS_KEY).await?)
    }

    /// Whether `at` (epoch ms) has left the suppression window
    #[must_use]
    pub fn is_expired_at(&self, at: i64) -> bool {
        is_expired(at, self.clock.now_millis())
    }

    async fn read_map(&self) -> Option<Map<String, Value>> {
        let raw = match self.store.get_item(NOTIFIED_TRIPS_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Failed to read notified destinations");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => {
                warn!("Notified destinations blob is not an object, ignoring it");
                None
            }
            Err(e) => {
                warn!(error = %e, "Corrupt notified destinations, ignoring it");
                None
            }
        }
    }
}

fn is_expired(at: i64, now: i64) -> bool {
    now.saturating_sub(at) >= TTL_MS
}

fn timestamp_from_json(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    #[allow(clippy::cast_possible_truncation)]
    f.is_finite().then(|| f as i64)
}
