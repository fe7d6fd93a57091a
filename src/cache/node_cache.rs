//! Resolved node cache
//!
//! Entries are created on the first successful load or an explicit
//! injection, overwritten on re-load and only dropped by a full clear.

use crate::node::Node;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct NodeCache {
    entries: HashMap<String, Node>,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, uri: &str) -> Option<&Node> {
        self.entries.get(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.entries.contains_key(uri)
    }

    /// Store a node under its own URI, replacing any previous value
    pub fn insert(&mut self, node: Node) {
        self.entries.insert(node.uri.clone(), node);
    }

    /// Store a node under an alias key (e.g., the versionless URI it was requested by)
    pub fn insert_as(&mut self, uri: impl Into<String>, node: Node) {
        self.entries.insert(uri.into(), node);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
