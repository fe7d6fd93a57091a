//! Core transport trait.

use async_trait::async_trait;

/// A transport-level failure.
///
/// `status` is set when a response arrived but its body could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub status: Option<u16>,
}

impl TransportError {
    /// Failure before any response was received
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Failure after the response status came back
    pub fn after_response(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

/// Raw response as received, before any status or body checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 response with a JSON body
    pub fn ok_json(body: &serde_json::Value) -> Self {
        Self::new(200, body.to_string())
    }
}

/// JSON-over-HTTP POST capability used by the content client.
///
/// Implementations report any received response as `Ok`, whatever its
/// status; status and body validation happens in the client.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError>;
}
