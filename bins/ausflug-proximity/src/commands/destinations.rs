//! Destinations command - list the destination catalog

use crate::context::Context;
use crate::output::{print_json, Status};
use anyhow::Result;
use ausflug_geo::Coordinate;
use ausflug_proximity::platform::DestinationSource;
use owo_colors::OwoColorize;

/// Run destinations command
pub async fn run(ctx: &Context, with_coordinates: bool) -> Result<()> {
    let source = ctx.destination_source()?;
    let mut destinations = source.all_destinations().await?;
    let total = destinations.len();

    if with_coordinates {
        destinations.retain(|d| {
            Coordinate::from_optional(d.lat.as_deref(), d.lng.as_deref()).is_some()
        });
    }

    if ctx.is_json() {
        return print_json(&destinations);
    }

    Status::header(&format!("Destinations ({} of {total})", destinations.len()));
    for d in &destinations {
        let position = match Coordinate::from_optional(d.lat.as_deref(), d.lng.as_deref()) {
            Some(c) => format!("{:.5}, {:.5}", c.latitude, c.longitude),
            None => "no location".dimmed().to_string(),
        };
        println!("  {:>6}  {:<40} {}", d.id, d.name, position);
    }
    Ok(())
}
