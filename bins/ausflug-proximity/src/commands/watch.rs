//! Watch command - background tracking fed from stdin
//!
//! Each line is `lat,lon` or `lat,lon,epoch_ms`. Lines without a timestamp
//! are stamped with the current time. Fixes go through the same throttle
//! and handler as background updates on a device.

use super::{print_notification, Refused};
use crate::context::Context;
use crate::output::{print_json, Status};
use anyhow::Result;
use ausflug_geo::Coordinate;
use ausflug_proximity::platform::{LocationFix, LogNotifier};
use ausflug_proximity::{Clock, SystemClock};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

#[derive(Debug, Serialize)]
struct JsonWatchOutput {
    fixes: usize,
    skipped_lines: usize,
    notifications: Vec<ausflug_proximity::platform::ProximityNotification>,
    metrics: serde_json::Value,
}

/// Run watch command
pub async fn run(ctx: &Context) -> Result<()> {
    let notifier = Arc::new(LogNotifier::new());
    let location = ctx.location.clone();
    let controller = ctx.controller(notifier.clone())?;

    if !controller.start_tracking().await {
        return Err(Refused(
            "Tracking not started (enable location and proximity, and grant permissions)".into(),
        )
        .into());
    }

    if !ctx.is_json() {
        Status::info("Tracking; reading positions from stdin");
    }

    let follower = controller.follow_settings();
    let sender = location.sender();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut fixes = 0;
    let mut skipped_lines = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_fix(line, SystemClock.now_millis()) {
            Some(fix) => {
                sender.send_fix(fix);
                fixes += 1;
                // Bounded channel; keep the handler caught up.
                location.until_idle().await;
            }
            None => {
                warn!(line, "Ignoring malformed position");
                skipped_lines += 1;
            }
        }
    }

    location.until_idle().await;
    follower.abort();
    controller.stop_tracking().await;
    let notifications = notifier.delivered();

    if ctx.is_json() {
        return print_json(&JsonWatchOutput {
            fixes,
            skipped_lines,
            notifications,
            metrics: ausflug_telemetry::metrics().export_json(),
        });
    }

    println!();
    for notification in &notifications {
        print_notification(notification);
    }
    Status::success(&format!(
        "{fixes} position(s) processed, {} notification(s) sent",
        notifications.len()
    ));
    if let Some(stats) =
        ausflug_telemetry::metrics().histogram_stats(ausflug_telemetry::names::PASS_DURATION_MS)
    {
        Status::info(&format!(
            "Proximity passes: {} (mean {:.1} ms, p95 {:.1} ms)",
            stats.count, stats.mean, stats.p95
        ));
    }
    if skipped_lines > 0 {
        Status::warning(&format!("{skipped_lines} malformed line(s) ignored"));
    }
    Ok(())
}

/// Parse `lat,lon[,epoch_ms]`
fn parse_fix(line: &str, now_ms: i64) -> Option<LocationFix> {
    let mut parts = line.split(',').map(str::trim);
    let coordinate = Coordinate::parse(parts.next()?, parts.next()?)?;
    if !coordinate.is_valid() {
        return None;
    }
    let timestamp_ms = match parts.next() {
        Some(ts) => ts.parse().ok()?,
        None => now_ms,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(LocationFix::new(coordinate, timestamp_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fix() {
        let fix = parse_fix("47.5, 8.25", 99).unwrap();
        assert_eq!(fix.coordinate, Coordinate::new(47.5, 8.25));
        assert_eq!(fix.timestamp_ms, 99);

        let fix = parse_fix("47.5,8.25,1000", 99).unwrap();
        assert_eq!(fix.timestamp_ms, 1000);
    }

    #[test]
    fn test_parse_fix_rejects_malformed() {
        assert!(parse_fix("47.5", 0).is_none());
        assert!(parse_fix("abc,8", 0).is_none());
        assert!(parse_fix("95,8", 0).is_none());
        assert!(parse_fix("47,8,soon", 0).is_none());
        assert!(parse_fix("47,8,1,2", 0).is_none());
    }
}
