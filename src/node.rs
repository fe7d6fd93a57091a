//! Content nodes

use serde::{Deserialize, Serialize};

/// A content URI together with its value.
///
/// Requested nodes carry a possibly partial URI and an optional default.
/// Resolved nodes carry the canonical URI and the final value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub uri: String,
    pub value: Option<String>,
}

impl Node {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            value: None,
        }
    }

    /// Node with a default value, used until the server supplies one
    pub fn with_default(uri: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            value: Some(value.into()),
        }
    }
}

impl From<&str> for Node {
    fn from(uri: &str) -> Self {
        Node::new(uri)
    }
}

impl From<String> for Node {
    fn from(uri: String) -> Self {
        Node::new(uri)
    }
}
