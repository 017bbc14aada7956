//! Notified command - inspect or reset the 24h ledger

use crate::context::Context;
use crate::output::{print_json, Status};
use anyhow::Result;
use chrono::{Local, TimeZone};
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct NotifiedEntry {
    id: i64,
    notified_at_ms: i64,
    expired: bool,
}

/// List recorded destinations
pub async fn list(ctx: &Context) -> Result<()> {
    let entries: Vec<NotifiedEntry> = ctx
        .notified
        .entries()
        .await
        .into_iter()
        .map(|(id, at)| NotifiedEntry {
            id,
            notified_at_ms: at,
            expired: ctx.notified.is_expired_at(at),
        })
        .collect();

    if ctx.is_json() {
        return print_json(&entries);
    }

    Status::header("Notified destinations");
    if entries.is_empty() {
        Status::info("None recorded");
        return Ok(());
    }

    for entry in &entries {
        let when = Local
            .timestamp_millis_opt(entry.notified_at_ms)
            .single()
            .map_or_else(|| entry.notified_at_ms.to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        let status = if entry.expired {
            "expired".dimmed().to_string()
        } else {
            "suppressed".yellow().to_string()
        };
        println!("  {:>8}  {}  {}", entry.id, when, status);
    }
    Ok(())
}

/// Forget every recorded destination
pub async fn clear(ctx: &Context) -> Result<()> {
    let removed = ctx.notified.clear().await?;
    if ctx.is_json() {
        return print_json(&serde_json::json!({ "cleared": removed }));
    }
    if removed {
        Status::success("Notified ledger cleared");
    } else {
        Status::info("Notified ledger was already empty");
    }
    Ok(())
}
