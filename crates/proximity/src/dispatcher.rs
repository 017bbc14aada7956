//! Notification fan-out for proximity matches

use crate::evaluator::ProximityMatch;
use crate::notified::NotifiedStore;
use crate::platform::{NotificationPresentation, Notifier, ProximityNotification};
use ausflug_geo::format_distance;
use ausflug_telemetry::{metrics, names};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Title of every proximity notification
pub const NOTIFICATION_TITLE: &str = "📍 Ausflugsziel in der Nähe!";

impl ProximityNotification {
    /// Notification announcing `m`
    pub fn for_match(m: &ProximityMatch) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: format!(
                "{} ist nur {} entfernt.",
                m.destination.name,
                format_distance(m.distance_m)
            ),
            data: json!({ "tripId": m.destination.id }),
            presentation: NotificationPresentation::default(),
        }
    }
}

/// Outcome of one dispatch pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Notifications the platform accepted
    pub sent: usize,
    /// Notifications the platform rejected
    pub failed: usize,
    /// Ids recorded in the 24h ledger, in dispatch order
    pub notified_ids: Vec<i64>,
}

impl DispatchReport {
    /// Matches handled in this pass
    #[must_use]
    pub fn total(&self) -> usize {
        self.sent + self.failed
    }
}

/// Shows one notification per match and records each id as notified
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    notified: Arc<NotifiedStore>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, notified: Arc<NotifiedStore>) -> Self {
        Self { notifier, notified }
    }

    /// Announce every match, in order.
    ///
    /// A failed notification is logged and does not stop the pass. Each id is
    /// recorded as notified whether or not its notification went out, so a
    /// failing platform does not cause a retry storm.
    pub async fn dispatch(&self, matches: &[ProximityMatch]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for m in matches {
            let id = m.destination.id;
            let notification = ProximityNotification::for_match(m);

            match self.notifier.schedule_immediate(&notification).await {
                Ok(notification_id) => {
                    report.sent += 1;
                    metrics().increment(names::NOTIFICATIONS_SENT);
                    info!(
                        id,
                        name = %m.destination.name,
                        distance_m = m.distance_m,
                        notification_id = %notification_id,
                        "Proximity notification sent"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    metrics().increment(names::NOTIFICATIONS_FAILED);
                    error!(id, error = %e, "Failed to send proximity notification");
                }
            }

            match self.notified.mark_notified(id).await {
                Ok(()) => report.notified_ids.push(id),
                Err(e) => warn!(id, error = %e, "Failed to record notified destination"),
            }
        }

        report
    }
}
