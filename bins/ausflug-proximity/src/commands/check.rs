//! Check command - one proximity pass at a given position

use super::{print_notification, Refused};
use crate::context::Context;
use crate::output::{print_json, Status};
use anyhow::Result;
use ausflug_geo::Coordinate;
use ausflug_proximity::platform::{LocationFix, LogNotifier, ProximityNotification};
use ausflug_proximity::{Clock, DispatchReport, SystemClock};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct JsonCheckOutput {
    position: Coordinate,
    report: DispatchReport,
    notifications: Vec<ProximityNotification>,
}

/// Run check command
pub async fn run(ctx: &Context, lat: f64, lon: f64) -> Result<()> {
    let position = Coordinate::new(lat, lon);
    if !position.is_valid() {
        anyhow::bail!("Invalid position {lat},{lon}");
    }

    let settings = ctx.settings.load().await;
    if !settings.tracking_allowed() {
        return Err(Refused(
            "Proximity notifications are off (enable location and proximity first)".into(),
        )
        .into());
    }

    let notifier = Arc::new(LogNotifier::new());
    let controller = ctx.controller(notifier.clone())?;
    ctx.location
        .sender()
        .send_fix(LocationFix::new(position, SystemClock.now_millis()));
    let report = controller.check_proximity_now().await;
    let notifications = notifier.delivered();

    if ctx.is_json() {
        return print_json(&JsonCheckOutput {
            position,
            report,
            notifications,
        });
    }

    Status::header(&format!(
        "Proximity check at {lat:.5}, {lon:.5} (radius {} m)",
        settings.proximity_distance
    ));
    if notifications.is_empty() {
        Status::info("No new destinations nearby");
        return Ok(());
    }

    println!();
    for notification in &notifications {
        print_notification(notification);
    }
    Status::success(&format!("{} notification(s) sent", report.sent));
    if report.failed > 0 {
        Status::warning(&format!("{} notification(s) failed", report.failed));
    }
    Ok(())
}
