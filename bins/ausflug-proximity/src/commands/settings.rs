//! Settings command - show and change location settings

use super::Refused;
use crate::context::Context;
use crate::output::{on_off, print_json, Status};
use anyhow::Result;
use ausflug_proximity::{LocationSettings, DISTANCE_OPTIONS};

/// Print current settings
pub async fn show(ctx: &Context) -> Result<()> {
    let settings = ctx.settings.load().await;
    print_settings(ctx, &settings)
}

pub async fn set_location(ctx: &Context, enabled: bool) -> Result<()> {
    if enabled {
        if !ctx.settings.enable_location(ctx.location.as_ref()).await? {
            return Err(Refused("Location permission not granted".into()).into());
        }
    } else {
        ctx.settings.set_location_enabled(false).await?;
    }
    let settings = ctx.settings.load().await;
    if !ctx.is_json() {
        Status::success(&format!("Location {}", on_off(enabled)));
    }
    print_settings(ctx, &settings)
}

pub async fn set_proximity(ctx: &Context, enabled: bool) -> Result<()> {
    if !ctx.settings.set_proximity_enabled(enabled).await? {
        return Err(Refused(
            "Enable location first: ausflug-proximity settings location on".into(),
        )
        .into());
    }
    if !ctx.is_json() {
        Status::success(&format!("Proximity notifications {}", on_off(enabled)));
    }
    let settings = ctx.settings.load().await;
    print_settings(ctx, &settings)
}

pub async fn set_distance(ctx: &Context, meters: u32) -> Result<()> {
    if meters == 0 {
        anyhow::bail!("Distance must be positive");
    }
    let settings = ctx.settings.set_proximity_distance(meters).await?;
    if !ctx.is_json() {
        Status::success(&format!("Notification radius set to {meters} m"));
        if !DISTANCE_OPTIONS.contains(&meters) {
            Status::warning(&format!(
                "{meters} m is not one of the app's options {DISTANCE_OPTIONS:?}"
            ));
        }
    }
    print_settings(ctx, &settings)
}

fn print_settings(ctx: &Context, settings: &LocationSettings) -> Result<()> {
    if ctx.is_json() {
        return print_json(settings);
    }

    Status::header("Location settings");
    println!("  {:<26} {}", "Location", on_off(settings.location_enabled));
    println!(
        "  {:<26} {}",
        "Proximity notifications",
        on_off(settings.proximity_notifications_enabled)
    );
    println!("  {:<26} {} m", "Radius", settings.proximity_distance);
    Ok(())
}
