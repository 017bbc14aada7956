//! Location service fed from an in-process channel
//!
//! Stands in for the OS location provider in the CLI and in tests. Fixes
//! pushed through a [`FixSender`] fan out to every active registration.
//! Each registration runs its own delivery loop and applies the
//! time/distance throttle from its [`LocationUpdateOptions`].

use super::{
    LocationDelivery, LocationFix, LocationService, LocationTaskHandler, LocationUpdateOptions,
    PermissionStatus,
};
use crate::error::{ProximityError, Result};
use ausflug_core::config::LocationAccuracy;
use ausflug_geo::haversine_distance_meters;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 64;

/// Pushes fixes into a [`ChannelLocationService`]
#[derive(Clone)]
pub struct FixSender {
    deliveries: broadcast::Sender<LocationDelivery>,
    last_fix: Arc<Mutex<Option<LocationFix>>>,
    /// Number of deliveries sent so far; guards ordering against `subscribe`
    sequence: Arc<Mutex<u64>>,
}

impl FixSender {
    /// Deliver a single fix; returns how many registrations received it
    pub fn send_fix(&self, fix: LocationFix) -> usize {
        self.send_batch(vec![fix])
    }

    /// Deliver a batch of fixes, oldest first
    pub fn send_batch(&self, fixes: Vec<LocationFix>) -> usize {
        if let Some(last) = fixes.last() {
            *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner) = Some(*last);
        }
        self.send(LocationDelivery::Fixes(fixes))
    }

    /// Deliver a provider error
    pub fn send_error(&self, message: impl Into<String>) -> usize {
        self.send(LocationDelivery::Error(message.into()))
    }

    fn send(&self, delivery: LocationDelivery) -> usize {
        let mut sequence = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);
        *sequence += 1;
        self.deliveries.send(delivery).unwrap_or(0)
    }

    /// Subscribe, returning the sequence number the receiver starts after
    fn subscribe(&self) -> (broadcast::Receiver<LocationDelivery>, u64) {
        let sequence = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);
        (self.deliveries.subscribe(), *sequence)
    }

    fn sent(&self) -> u64 {
        *self.sequence.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Registration {
    stop: oneshot::Sender<()>,
    /// Sequence number at registration
    base: u64,
    /// Deliveries consumed (handled, throttled or lagged) by the loop
    consumed: watch::Receiver<u64>,
}

/// In-process [`LocationService`]
pub struct ChannelLocationService {
    sender: FixSender,
    foreground_permission: Mutex<PermissionStatus>,
    background_permission: Mutex<PermissionStatus>,
    registrations: Mutex<HashMap<String, Registration>>,
    start_calls: AtomicUsize,
}

impl Default for ChannelLocationService {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelLocationService {
    /// Service with both permissions granted and no known position
    pub fn new() -> Self {
        let (deliveries, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender: FixSender {
                deliveries,
                last_fix: Arc::new(Mutex::new(None)),
                sequence: Arc::new(Mutex::new(0)),
            },
            foreground_permission: Mutex::new(PermissionStatus::Granted),
            background_permission: Mutex::new(PermissionStatus::Granted),
            registrations: Mutex::new(HashMap::new()),
            start_calls: AtomicUsize::new(0),
        }
    }

    /// Answer foreground permission requests with `status`
    #[must_use]
    pub fn with_foreground_permission(self, status: PermissionStatus) -> Self {
        *self
            .foreground_permission
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = status;
        self
    }

    /// Answer background permission requests with `status`
    #[must_use]
    pub fn with_background_permission(self, status: PermissionStatus) -> Self {
        self.set_background_permission(status);
        self
    }

    pub fn set_background_permission(&self, status: PermissionStatus) {
        *self
            .background_permission
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = status;
    }

    /// Handle for pushing fixes
    #[must_use]
    pub fn sender(&self) -> FixSender {
        self.sender.clone()
    }

    /// Number of successful `start_location_updates` calls so far
    #[must_use]
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    /// Wait until every active registration has consumed all fixes sent so
    /// far, including the handler run for the last one.
    pub async fn until_idle(&self) {
        let target = self.sender.sent();
        let pending: Vec<(u64, watch::Receiver<u64>)> = self
            .registrations()
            .values()
            .map(|r| (r.base, r.consumed.clone()))
            .collect();

        for (base, mut consumed) in pending {
            // Err means the loop ended; nothing left to wait for.
            let _ = consumed.wait_for(|n| base + n >= target).await;
        }
    }

    fn registrations(&self) -> std::sync::MutexGuard<'_, HashMap<String, Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LocationService for ChannelLocationService {
    async fn current_position(&self, accuracy: LocationAccuracy) -> Result<LocationFix> {
        let last = *self
            .sender
            .last_fix
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        debug!(?accuracy, known = last.is_some(), "Current position requested");
        last.ok_or_else(|| ProximityError::LocationUnavailable("no fix received yet".into()))
    }

    async fn request_foreground_permission(&self) -> PermissionStatus {
        *self
            .foreground_permission
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn request_background_permission(&self) -> PermissionStatus {
        *self
            .background_permission
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn has_started_location_updates(&self, task_name: &str) -> bool {
        self.registrations().contains_key(task_name)
    }

    async fn start_location_updates(
        &self,
        task_name: &str,
        options: &LocationUpdateOptions,
        handler: Arc<dyn LocationTaskHandler>,
    ) -> Result<()> {
        let mut registrations = self.registrations();
        if registrations.contains_key(task_name) {
            return Err(ProximityError::Platform(format!(
                "location task '{task_name}' is already registered"
            )));
        }

        let (receiver, base) = self.sender.subscribe();
        let (stop, stop_rx) = oneshot::channel();
        let (consumed_tx, consumed) = watch::channel(0);
        tokio::spawn(delivery_loop(
            task_name.to_string(),
            options.clone(),
            receiver,
            stop_rx,
            consumed_tx,
            handler,
        ));

        registrations.insert(
            task_name.to_string(),
            Registration {
                stop,
                base,
                consumed,
            },
        );
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        info!(task = task_name, "Location updates started");
        Ok(())
    }

    async fn stop_location_updates(&self, task_name: &str) -> Result<()> {
        let registration = self.registrations().remove(task_name);
        match registration {
            Some(registration) => {
                // The loop may already be gone if the channel closed.
                let _ = registration.stop.send(());
                info!(task = task_name, "Location updates stopped");
            }
            None => debug!(task = task_name, "Location task was not registered"),
        }
        Ok(())
    }
}

async fn delivery_loop(
    task_name: String,
    options: LocationUpdateOptions,
    mut receiver: broadcast::Receiver<LocationDelivery>,
    mut stop: oneshot::Receiver<()>,
    consumed: watch::Sender<u64>,
    handler: Arc<dyn LocationTaskHandler>,
) {
    let mut throttle = Throttle::new(&options);

    loop {
        // Stop is only observed between deliveries; a running handler completes.
        let delivery = tokio::select! {
            biased;
            _ = &mut stop => break,
            received = receiver.recv() => match received {
                Ok(delivery) => delivery,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(task = %task_name, skipped, "Location deliveries dropped");
                    consumed.send_modify(|n| *n += skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };

        if let LocationDelivery::Fixes(fixes) = &delivery {
            if let Some(first) = fixes.first() {
                if !throttle.admit(first) {
                    debug!(task = %task_name, "Fix throttled");
                    consumed.send_modify(|n| *n += 1);
                    continue;
                }
            }
        }

        handler.on_location_update(delivery).await;
        consumed.send_modify(|n| *n += 1);
    }

    debug!(task = %task_name, "Delivery loop finished");
}

/// Delivers a fix once enough time has passed or the device moved far enough
struct Throttle {
    interval_ms: i64,
    distance_m: f64,
    last: Option<LocationFix>,
}

impl Throttle {
    fn new(options: &LocationUpdateOptions) -> Self {
        Self {
            interval_ms: i64::try_from(options.time_interval.as_millis()).unwrap_or(i64::MAX),
            distance_m: f64::from(options.distance_interval_m),
            last: None,
        }
    }

    fn admit(&mut self, fix: &LocationFix) -> bool {
        let admit = match &self.last {
            None => true,
            Some(last) => {
                fix.timestamp_ms.saturating_sub(last.timestamp_ms) >= self.interval_ms
                    || haversine_distance_meters(&last.coordinate, &fix.coordinate)
                        >= self.distance_m
            }
        };
        if admit {
            self.last = Some(*fix);
        }
        admit
    }
}
