//! CLI command implementations

pub mod check;
pub mod destinations;
pub mod notified;
pub mod settings;
pub mod watch;

use ausflug_proximity::platform::ProximityNotification;
use ausflug_proximity::route_for_notification;
use owo_colors::OwoColorize;
use thiserror::Error;

/// The platform or the user's settings refused the request
#[derive(Debug, Error)]
#[error("{0}")]
pub struct Refused(pub String);

/// Print a notification the way a device would show it
pub(crate) fn print_notification(notification: &ProximityNotification) {
    println!("  {}", notification.title.bold());
    println!("  {}", notification.body);
    if let Some(route) = route_for_notification(&notification.data) {
        println!("  {} {}", "→".dimmed(), route.dimmed());
    }
    println!();
}
