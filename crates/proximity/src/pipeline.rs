//! One proximity pass: evaluate a position, then dispatch the matches

use crate::dispatcher::{DispatchReport, NotificationDispatcher};
use crate::evaluator::ProximityEvaluator;
use crate::notified::NotifiedStore;
use crate::platform::{DestinationSource, LocationDelivery, LocationTaskHandler, Notifier};
use crate::settings::LocationSettingsStore;
use ausflug_geo::Coordinate;
use ausflug_telemetry::{metrics, names, Timer};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, instrument};

/// Evaluator and dispatcher wired together.
///
/// Also the handler registered for background location deliveries.
pub struct ProximityPipeline {
    evaluator: ProximityEvaluator,
    dispatcher: NotificationDispatcher,
}

impl ProximityPipeline {
    pub fn new(
        settings: Arc<LocationSettingsStore>,
        notified: Arc<NotifiedStore>,
        destinations: Arc<dyn DestinationSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            evaluator: ProximityEvaluator::new(settings, notified.clone(), destinations),
            dispatcher: NotificationDispatcher::new(notifier, notified),
        }
    }

    pub fn settings(&self) -> &Arc<LocationSettingsStore> {
        self.evaluator.settings()
    }

    pub fn notified(&self) -> &Arc<NotifiedStore> {
        self.evaluator.notified()
    }

    pub fn evaluator(&self) -> &ProximityEvaluator {
        &self.evaluator
    }

    /// Evaluate `position` and notify for every match
    #[instrument(skip(self), fields(lat = position.latitude, lon = position.longitude))]
    pub async fn run(&self, position: Coordinate) -> DispatchReport {
        let timer = Timer::start(names::PASS_DURATION_MS);
        metrics().increment(names::PROXIMITY_CHECKS);

        let matches = self.evaluator.evaluate_at(position).await;
        let report = if matches.is_empty() {
            DispatchReport::default()
        } else {
            self.dispatcher.dispatch(&matches).await
        };

        timer.stop();
        report
    }
}

#[async_trait]
impl LocationTaskHandler for ProximityPipeline {
    async fn on_location_update(&self, delivery: LocationDelivery) {
        match delivery {
            LocationDelivery::Error(message) => {
                error!(error = %message, "Background location delivery failed");
            }
            LocationDelivery::Fixes(fixes) => match fixes.first() {
                Some(fix) => {
                    let report = self.run(fix.coordinate).await;
                    debug!(sent = report.sent, failed = report.failed, "Background pass finished");
                }
                None => debug!("Empty location batch ignored"),
            },
        }
    }
}
