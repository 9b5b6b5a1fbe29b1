//! Shared HTTP request executor
//!
//! Every adapter call goes through one [`RequestExecutor`], which applies, in
//! order: the default JSON content-type, the adapter's auth headers, a fixed
//! per-attempt timeout, and retry with exponential backoff on any failure
//! (non-2xx status or transport error). Exhausting the retry budget surfaces
//! the last error; nothing is swallowed.

use std::time::Duration;

use reqwest::{Client, Method, header};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::error::ProviderError;

/// Per-attempt request timeout in milliseconds
pub const REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Retry behavior for outbound requests
///
/// Delay before the next attempt is `base_delay * 2^attempt`: with the
/// default one-second base that is 1s after the first failure and 2s after
/// the second.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (default: 3)
    pub max_attempts: u32,
    /// Base backoff delay (default: 1s)
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given 0-indexed failed attempt
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * 2_u32.saturating_pow(attempt)
    }
}

/// How the executor authenticates outbound requests
#[derive(Clone)]
pub enum AuthScheme {
    /// No auth headers (local backends)
    None,
    /// `Authorization: Bearer <credential>`
    Bearer(SecretString),
}

impl AuthScheme {
    fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::None => request,
            Self::Bearer(token) => request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            ),
        }
    }
}

impl std::fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "AuthScheme::None"),
            Self::Bearer(_) => write!(f, "AuthScheme::Bearer(<redacted>)"),
        }
    }
}

/// HTTP executor shared by all provider adapters
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    base_url: String,
    auth: AuthScheme,
    retry: RetryPolicy,
}

impl RequestExecutor {
    /// Create an executor for a backend base URL
    pub fn new(base_url: impl Into<String>, auth: AuthScheme) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .build()
            .map_err(|e| ProviderError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            retry: RetryPolicy::default(),
        })
    }

    /// Override the retry policy (tests shrink the delays)
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The backend base URL this executor targets
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL for an endpoint path
    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// GET an endpoint and deserialize the JSON response
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, ProviderError> {
        let response = self.execute(Method::GET, endpoint, None).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    /// GET an endpoint, returning only success or failure
    pub async fn get(&self, endpoint: &str) -> Result<(), ProviderError> {
        self.execute(Method::GET, endpoint, None).await.map(|_| ())
    }

    /// POST a JSON body and deserialize the JSON response
    pub async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &impl serde::Serialize,
    ) -> Result<T, ProviderError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let response = self.execute(Method::POST, endpoint, Some(body)).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    /// Execute with retry; the backoff delay is fully awaited between attempts
    async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = self.url(endpoint);
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..self.retry.max_attempts {
            match self.attempt(method.clone(), &url, body.as_ref()).await {
                Ok(response) => {
                    if attempt > 0 {
                        debug!(url = %url, attempt = attempt + 1, "Request succeeded after retry");
                    }
                    return Ok(response);
                },
                Err(err) => {
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        max_attempts = self.retry.max_attempts,
                        error = %err,
                        "Request attempt failed"
                    );
                    last_error = Some(err);

                    if attempt + 1 < self.retry.max_attempts {
                        tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
                    }
                },
            }
        }

        Err(last_error
            .unwrap_or_else(|| ProviderError::RequestFailed("retry budget exhausted".to_string())))
    }

    async fn attempt(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ProviderError> {
        let mut request = self
            .client
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json");
        request = self.auth.apply(request);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}
