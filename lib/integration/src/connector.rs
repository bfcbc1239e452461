//! Data-access backend connector.
//!
//! The backend exposes two POST endpoints under a base URL, one per
//! [`QueryKind`]. Both accept `{"query": "..."}` and return an arbitrary
//! JSON payload that is forwarded verbatim as the tool result.

use crate::error::ConnectorError;
use crate::query::QueryKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, instrument};

/// Trait for data-access backends.
#[async_trait]
pub trait DataAccessBackend: Send + Sync {
    /// Sends a query to the endpoint for `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status or a
    /// response body that is not JSON.
    async fn execute(&self, kind: QueryKind, query: &str) -> Result<JsonValue, ConnectorError>;
}

/// Configuration for the data-access backend.
#[derive(Debug, Clone, Deserialize)]
pub struct DataAccessConfig {
    /// Base URL; the `query` and `mutate` endpoints live directly under it.
    pub base_url: String,
    /// Client-side request timeout, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl DataAccessConfig {
    /// Creates a configuration with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

/// HTTP implementation of [`DataAccessBackend`].
#[derive(Debug, Clone)]
pub struct HttpDataAccess {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDataAccess {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> queryline_core::Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectorError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or the HTTP client cannot
    /// be built.
    pub fn from_config(config: &DataAccessConfig) -> queryline_core::Result<Self, ConnectorError> {
        if config.base_url.trim().is_empty() {
            return Err(ConnectorError::InvalidConfig {
                reason: "base URL is empty".to_string(),
            }
            .into());
        }
        Self::new(
            config.base_url.as_str(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Returns the endpoint URL for a query kind.
    #[must_use]
    pub fn endpoint_url(&self, kind: QueryKind) -> String {
        format!("{}/{}", self.base_url, kind.path())
    }
}

#[async_trait]
impl DataAccessBackend for HttpDataAccess {
    #[instrument(skip(self, query), fields(kind = %kind))]
    async fn execute(&self, kind: QueryKind, query: &str) -> Result<JsonValue, ConnectorError> {
        let url = self.endpoint_url(kind);

        let response = self
            .client
            .post(&url)
            .json(&QueryBody { query })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ConnectorError::Timeout
                } else {
                    ConnectorError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectorError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let payload = response
            .json::<JsonValue>()
            .await
            .map_err(|e| ConnectorError::InvalidResponse {
                reason: e.to_string(),
            })?;

        debug!(endpoint = %url, "Data access request succeeded");
        Ok(payload)
    }
}
