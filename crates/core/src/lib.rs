//! Core utilities for the AusflugFinder proximity toolkit
//!
//! This crate provides shared functionality used by the pipeline crates and
//! the driver binary:
//!
//! - **Error handling**: Structured errors with codes, context, and recovery suggestions
//! - **Configuration**: TOML-based configuration with serde defaults
//! - **Key-value persistence**: Async string store with file and in-memory backends
//! - **Resilience**: Retry policy and circuit breaker used by the API client
//!
//! # Example
//!
//! ```rust,no_run
//! use ausflug_core::{config::Config, kv::FileStore};
//!
//! let config = Config::load(None).expect("invalid ausflug.toml");
//! let store = FileStore::new(config.schema.storage.resolve_data_dir())
//!     .expect("data directory not writable");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod kv;
pub mod retry;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{AppConfig, Config};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::kv::{FileStore, KeyValueStore, MemoryStore};
    pub use crate::retry::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryConfig};
}
