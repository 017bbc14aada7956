//! Configuration for the Supabase client
//!
//! Supports environment-based configuration with sensible defaults.

use crate::error::{ApiError, ApiResult};
use ausflug_core::retry::{CircuitBreakerConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Local Supabase started with `supabase start`
const LOCAL_SUPABASE_URL: &str = "http://localhost:54321";

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (typically localhost Supabase)
    Development,
    /// Preview builds
    Staging,
    /// Production environment
    #[default]
    Production,
}

impl Environment {
    /// Parse from the `AUSFLUG_ENV` environment variable
    pub fn from_env() -> Self {
        Self::parse(&env::var("AUSFLUG_ENV").unwrap_or_default())
    }

    fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "development" | "dev" | "local" => Self::Development,
            "staging" | "stage" | "preview" => Self::Staging,
            _ => Self::Production,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Supabase project URL, e.g. `https://xyz.supabase.co`
    pub project_url: String,
    /// Supabase anonymous key, sent as `apikey` and bearer token
    pub anon_key: Option<String>,
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Circuit breaker configuration
    pub circuit_breaker: CircuitBreakerConfig,
    /// Current environment
    pub environment: Environment,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `SUPABASE_URL` (or `EXPO_PUBLIC_SUPABASE_URL`): project URL, required
    ///   outside development
    /// - `SUPABASE_ANON_KEY` (or `EXPO_PUBLIC_SUPABASE_ANON_KEY`): anon key
    /// - `AUSFLUG_ENV`: development/staging/production
    /// - `AUSFLUG_TIMEOUT_SECS`: request timeout in seconds
    pub fn from_env() -> ApiResult<Self> {
        let environment = Environment::from_env();

        let project_url = match env_any(&["SUPABASE_URL", "EXPO_PUBLIC_SUPABASE_URL"]) {
            Some(url) => url,
            None if environment == Environment::Development => LOCAL_SUPABASE_URL.to_string(),
            None => return Err(ApiError::missing_env("SUPABASE_URL")),
        };

        let anon_key = env_any(&["SUPABASE_ANON_KEY", "EXPO_PUBLIC_SUPABASE_ANON_KEY"]);

        let timeout = env::var("AUSFLUG_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(Duration::from_secs(15), Duration::from_secs);

        let retry = match environment {
            Environment::Development => RetryConfig::quick(),
            Environment::Staging => RetryConfig::default(),
            Environment::Production => RetryConfig::patient(),
        };

        Ok(Self {
            project_url,
            anon_key,
            timeout,
            retry,
            circuit_breaker: CircuitBreakerConfig::default(),
            environment,
        })
    }

    /// Create development configuration (local Supabase)
    #[must_use]
    pub fn development() -> Self {
        Self {
            project_url: LOCAL_SUPABASE_URL.to_string(),
            anon_key: None,
            timeout: Duration::from_secs(10),
            retry: RetryConfig::quick(),
            circuit_breaker: CircuitBreakerConfig::default(),
            environment: Environment::Development,
        }
    }

    /// Builder-style method to set the project URL
    #[must_use]
    pub fn with_project_url(mut self, url: impl Into<String>) -> Self {
        self.project_url = url.into();
        self
    }

    /// Builder-style method to set anon key
    #[must_use]
    pub fn with_anon_key(mut self, key: impl Into<String>) -> Self {
        self.anon_key = Some(key.into());
        self
    }

    /// Builder-style method to set retry config
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// PostgREST base URL (`<project>/rest/v1`)
    #[must_use]
    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.project_url.trim_end_matches('/'))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.project_url.is_empty() {
            return Err(ApiError::config("project_url cannot be empty"));
        }

        if !self.project_url.starts_with("http://") && !self.project_url.starts_with("https://") {
            return Err(ApiError::config("project_url must start with http:// or https://"));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        if self.environment != Environment::Development && self.anon_key.is_none() {
            return Err(ApiError::missing_env("SUPABASE_ANON_KEY"));
        }

        Ok(())
    }
}

fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| env::var(name).ok().filter(|v| !v.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_local() {
        let config = ClientConfig::default();
        assert!(config.project_url.contains("localhost"));
        assert_eq!(config.environment, Environment::Development);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rest_url_trims_slash() {
        let config = ClientConfig::default().with_project_url("https://abc.supabase.co/");
        assert_eq!(config.rest_url(), "https://abc.supabase.co/rest/v1");
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("dev"), Environment::Development);
        assert_eq!(Environment::parse("Preview"), Environment::Staging);
        assert_eq!(Environment::parse(""), Environment::Production);
    }

    #[test]
    fn test_validation() {
        let invalid = ClientConfig::default().with_project_url("");
        assert!(invalid.validate().is_err());

        let mut production = ClientConfig::default().with_project_url("https://abc.supabase.co");
        production.environment = Environment::Production;
        assert!(matches!(production.validate(), Err(ApiError::MissingEnvVar(_))));

        let production = production.with_anon_key("anon");
        assert!(production.validate().is_ok());
    }
}
