//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::DestinationsApi;
use crate::error::{ApiError, ApiResult};
use ausflug_core::retry::{retry, CircuitBreaker, CircuitState};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// API key header for Supabase
const APIKEY_HEADER: &str = "apikey";

/// Supabase PostgREST client with built-in resilience patterns
///
/// This client wraps `reqwest` and adds:
/// - Automatic retry with exponential backoff
/// - Circuit breaker to stop hammering a failing backend
/// - Request correlation IDs for tracing
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Client,
    config: Arc<ClientConfig>,
    rest_url: Arc<str>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl SupabaseClient {
    /// Create a new client with configuration from environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(USER_AGENT, HeaderValue::from_static("ausflug-api-client/0.3"));

        if let Some(ref key) = config.anon_key {
            let apikey = HeaderValue::from_str(key)
                .map_err(|_| ApiError::config("anon key contains invalid header characters"))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| ApiError::config("anon key contains invalid header characters"))?;
            default_headers.insert(APIKEY_HEADER, apikey);
            default_headers.insert(AUTHORIZATION, bearer);
        }

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        let circuit_breaker = Arc::new(CircuitBreaker::new(config.circuit_breaker.clone()));
        let rest_url: Arc<str> = Arc::from(config.rest_url());

        Ok(Self {
            inner,
            config: Arc::new(config),
            rest_url,
            circuit_breaker,
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// PostgREST base URL
    #[must_use]
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    /// Get circuit breaker state
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.circuit_breaker.state()
    }

    /// Access the `ausfluege` table
    #[must_use]
    pub fn destinations(&self) -> DestinationsApi {
        DestinationsApi::new(self.clone())
    }

    /// GET a PostgREST path (relative to `/rest/v1`) with retry and circuit breaking
    #[instrument(skip(self), fields(request_id))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = format!("{}/{}", self.rest_url, path.trim_start_matches('/'));
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        if !self.circuit_breaker.can_execute() {
            warn!(request_id = %request_id, url = %url, "Circuit breaker is open, rejecting request");
            return Err(ApiError::CircuitOpen);
        }

        let start = Instant::now();
        let result = retry(&self.config.retry, ApiError::is_retryable, || {
            self.execute_single_request(&request_id, &url)
        })
        .await;

        match result {
            Ok(outcome) => {
                self.circuit_breaker.record_success();
                debug!(
                    request_id = %request_id,
                    attempts = outcome.attempts,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Request succeeded"
                );
                Ok(outcome.value)
            }
            Err(e) => {
                self.circuit_breaker.record_failure();
                debug!(request_id = %request_id, error = %e, "Request failed");
                Err(e)
            }
        }
    }

    /// Execute a single request without retry
    async fn execute_single_request<T: DeserializeOwned>(
        &self,
        request_id: &str,
        url: &str,
    ) -> ApiResult<T> {
        let response = self
            .inner
            .get(url)
            .header(X_REQUEST_ID, request_id)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Handle HTTP response and deserialize
    async fn handle_response<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(ApiError::api_response(status.as_u16(), message))
        }
    }
}
