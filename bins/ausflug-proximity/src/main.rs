//! ausflug-proximity - AusflugFinder proximity notifications from the terminal
//!
//! Runs the same pipeline the app runs on a location fix: read the user's
//! settings, test every destination against the notification radius, and
//! announce the new ones. Notifications are printed instead of posted.

use ausflug_core::config::Config;
use ausflug_core::error::exit_codes;
use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod context;
mod output;

use commands::{check, destinations, notified, settings, watch};
use context::Context;

/// Proximity notifications for AusflugFinder destinations
#[derive(Parser)]
#[command(name = "ausflug-proximity")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Configuration file (defaults to ./ausflug.toml if present)
    #[arg(short, long, global = true, env = "AUSFLUG_CONFIG")]
    config: Option<String>,

    /// Directory for persisted settings and the notified ledger
    #[arg(long, global = true, env = "AUSFLUG_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Read destinations from a JSON file instead of Supabase
    #[arg(long, global = true, env = "AUSFLUG_DESTINATIONS_FILE")]
    destinations_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one proximity pass at a position
    Check {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Track positions read from stdin, one `lat,lon[,epoch_ms]` per line
    Watch,

    /// Show or change location settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Inspect the 24h notified ledger
    Notified {
        #[command(subcommand)]
        action: Option<NotifiedAction>,
    },

    /// List destinations from the configured source
    Destinations {
        /// Only destinations with usable coordinates
        #[arg(long)]
        with_coordinates: bool,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current settings
    Show,

    /// Turn location features on or off
    Location {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Turn proximity notifications on or off
    Proximity {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Set the notification radius in meters
    Distance {
        meters: u32,
    },
}

#[derive(Subcommand)]
enum NotifiedAction {
    /// List recorded destinations and when they were announced
    List,

    /// Forget every recorded destination
    Clear,
}

/// On/off switch argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        self == Toggle::On
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                if let Ok(json) = serde_json::to_string_pretty(&e.to_report()) {
                    eprintln!("{json}");
                }
            } else {
                eprintln!("{} {}", "Error:".red().bold(), e);
            }
            return exit_code(exit_codes::CONFIG_ERROR);
        }
    };

    let telemetry = ausflug_telemetry::TelemetryConfig::from(&config.schema.logging)
        .verbose(cli.verbose);
    let _guard = match ausflug_telemetry::init_with_config(telemetry) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return exit_code(exit_codes::FAILURE);
        }
    };

    let ctx = match Context::new(
        config,
        cli.data_dir.clone(),
        cli.destinations_file.clone(),
        cli.format,
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            return exit_code(exit_codes::FAILURE);
        }
    };

    let result = match cli.command {
        Commands::Check { lat, lon } => check::run(&ctx, lat, lon).await,

        Commands::Watch => watch::run(&ctx).await,

        Commands::Settings { action } => match action.unwrap_or(SettingsAction::Show) {
            SettingsAction::Show => settings::show(&ctx).await,
            SettingsAction::Location { state } => {
                settings::set_location(&ctx, state.enabled()).await
            }
            SettingsAction::Proximity { state } => {
                settings::set_proximity(&ctx, state.enabled()).await
            }
            SettingsAction::Distance { meters } => settings::set_distance(&ctx, meters).await,
        },

        Commands::Notified { action } => match action.unwrap_or(NotifiedAction::List) {
            NotifiedAction::List => notified::list(&ctx).await,
            NotifiedAction::Clear => notified::clear(&ctx).await,
        },

        Commands::Destinations { with_coordinates } => {
            destinations::run(&ctx, with_coordinates).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            if e.downcast_ref::<commands::Refused>().is_some() {
                exit_code(exit_codes::PERMISSION_DENIED)
            } else {
                exit_code(exit_codes::FAILURE)
            }
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
