//! HTTP client for the quickstart backend
//!
//! Bodies are parsed as JSON whatever the HTTP status; request-level
//! failures are reported inside the body (see [`payload::extract_error`]).

pub mod payload;

use serde_json::Value;

/// Path segment of the only endpoint with a sync operation
pub const TRANSACTIONS_ENDPOINT: &str = "transactions";

/// Path of the transactions sync operation
pub const TRANSACTIONS_SYNC_PATH: &str = "/api/transactions/sync";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Could not decode response: {0}")]
    Decode(String),
}

/// Client for `{base_url}/api/...`
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the primary request for an endpoint
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// `GET /api/{endpoint}`
    pub async fn get_endpoint(&self, endpoint: &str) -> Result<Value, ApiError> {
        let url = self.endpoint_url(endpoint);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Self::read_body(response).await
    }

    /// `POST /api/transactions/sync`
    pub async fn sync_transactions(&self) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, TRANSACTIONS_SYNC_PATH);
        tracing::debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        Self::read_body(response).await
    }

    async fn read_body(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        tracing::debug!(
            "Response {} ({} top-level fields)",
            status,
            body.as_object().map_or(0, |o| o.len())
        );
        Ok(body)
    }
}
