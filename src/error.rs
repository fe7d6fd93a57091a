//! Error types for the content client

use std::fmt;
use thiserror::Error;

/// Status carried by [`ClientError::Missing`].
///
/// Lies outside the HTTP range so it can never collide with a real response.
pub const MISSING_STATUS: i32 = 1404;

/// Status reported when no response was received at all.
pub const NO_RESPONSE_STATUS: i32 = -1;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Details of the request that produced an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// HTTP method (always POST for the node endpoints)
    pub method: &'static str,
    /// Full endpoint URL
    pub url: String,
    /// Serialized request payload
    pub payload: String,
    /// Response status, if a response arrived
    pub status: Option<u16>,
    /// Response body, if a response arrived
    pub text: Option<String>,
}

impl RequestContext {
    pub(crate) fn new(url: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            method: "POST",
            url: url.into(),
            payload: payload.into(),
            status: None,
            text: None,
        }
    }
}

impl fmt::Display for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}\nRequest body: {}", self.method, self.url, self.payload)?;
        if let Some(status) = self.status {
            write!(f, "\nResponse status: {}", status)?;
        }
        if let Some(ref text) = self.text {
            write!(f, "\nResponse text: {}", text)?;
        }
        Ok(())
    }
}

/// Content client error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request succeeded but the server left this URI out of the response
    #[error("Missing result for node: {uri}")]
    Missing { uri: String },

    /// Response status outside 200..400
    #[error("Unexpected response status {status}\n{context}")]
    Status { status: u16, context: RequestContext },

    /// No response received (connection refused, DNS, timeout, ...)
    #[error("Request failed: {reason}\n{context}")]
    Transport { reason: String, context: RequestContext },

    /// Response body could not be read or was not a `uri -> value` JSON object
    #[error("Invalid response body: {reason}\n{context}")]
    Parse { reason: String, context: RequestContext },

    /// The lookup sat in a batch that was discarded by `reset_nodes`
    #[error("Lookup cancelled by reset: {uri}")]
    Cancelled { uri: String },
}

impl ClientError {
    /// Status code associated with this error.
    ///
    /// Real HTTP statuses for responses, [`MISSING_STATUS`] for omitted URIs
    /// and [`NO_RESPONSE_STATUS`] when nothing came back.
    pub fn status(&self) -> i32 {
        match self {
            ClientError::Missing { .. } => MISSING_STATUS,
            ClientError::Status { status, .. } => i32::from(*status),
            ClientError::Parse { context, .. } => context
                .status
                .map(i32::from)
                .unwrap_or(NO_RESPONSE_STATUS),
            ClientError::Transport { .. } | ClientError::Cancelled { .. } => NO_RESPONSE_STATUS,
        }
    }

    /// Whether this is the missing-URI error
    pub fn is_missing(&self) -> bool {
        matches!(self, ClientError::Missing { .. })
    }

    /// The request this error came from, when there was one
    pub fn context(&self) -> Option<&RequestContext> {
        match self {
            ClientError::Status { context, .. }
            | ClientError::Transport { context, .. }
            | ClientError::Parse { context, .. } => Some(context),
            ClientError::Missing { .. } | ClientError::Cancelled { .. } => None,
        }
    }
}
