//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;

use super::traits::*;

/// HTTP transport over a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing client (custom TLS, proxies, cookies...)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Transport whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::new(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| {
                TransportError::after_response(status, format!("Failed to read response body: {}", e))
            })?;

        Ok(TransportResponse { status, body })
    }
}
