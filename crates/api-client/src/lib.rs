//! Supabase REST client for AusflugFinder
//!
//! This crate talks to the PostgREST interface of the AusflugFinder Supabase
//! project. It currently exposes the `ausfluege` (destination) table, which
//! the proximity pipeline reads on every location fix.
//!
//! # Features
//!
//! - **Environment-based configuration**: Project URL and anon key from environment variables
//! - **Retry with exponential backoff**: Automatic retry for transient failures
//! - **Circuit breaker**: Stop calling a backend that keeps failing
//! - **Request correlation**: Every request carries a unique `X-Request-ID`
//!
//! # Example
//!
//! ```rust,no_run
//! use ausflug_api_client::SupabaseClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SupabaseClient::new()?;
//!
//!     let destinations = client.destinations().list_all().await?;
//!     println!("{} destinations", destinations.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;

pub use client::SupabaseClient;
pub use config::{ClientConfig, Environment};
pub use endpoints::destinations::Destination;
pub use error::{ApiError, ApiResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::SupabaseClient;
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::endpoints::{Destination, DestinationsApi};
    pub use crate::error::{ApiError, ApiResult};
}
