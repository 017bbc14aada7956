//! Error types for the proximity pipeline.
//!
//! Most pipeline operations log and swallow these; they surface only from
//! explicit persistence calls and from platform implementations.

use ausflug_api_client::ApiError;
use thiserror::Error;

/// Result type alias for proximity operations.
pub type Result<T> = std::result::Result<T, ProximityError>;

/// Errors raised by stores and platform collaborators.
#[derive(Debug, Error)]
pub enum ProximityError {
    /// Key-value persistence failed
    #[error("Storage error: {0}")]
    Storage(#[from] ausflug_core::Error),

    /// Destination backend failed
    #[error("Destination API error: {0}")]
    Api(#[from] ApiError),

    /// Persisted value could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Device position could not be obtained
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// The platform refused to show a notification
    #[error("Notification failed: {0}")]
    Notification(String),

    /// Background update registration failed
    #[error("Platform error: {0}")]
    Platform(String),
}

/// Error code for integration with ausflug-core error handling.
/// Range: 20xxx for proximity errors.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityErrorCode {
    Storage = 20001,
    Api = 20002,
    Serialization = 20003,
    LocationUnavailable = 20004,
    Notification = 20005,
    Platform = 20006,
}

impl ProximityError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ProximityErrorCode {
        match self {
            ProximityError::Storage(_) => ProximityErrorCode::Storage,
            ProximityError::Api(_) => ProximityErrorCode::Api,
            ProximityError::Serialization(_) => ProximityErrorCode::Serialization,
            ProximityError::LocationUnavailable(_) => ProximityErrorCode::LocationUnavailable,
            ProximityError::Notification(_) => ProximityErrorCode::Notification,
            ProximityError::Platform(_) => ProximityErrorCode::Platform,
        }
    }
}
