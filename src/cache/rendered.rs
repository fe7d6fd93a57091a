//! Rendered-node registry
//!
//! The same URI may be on screen several times at once, so entries are
//! reference counted. The published map always holds exactly the entries
//! with a non-zero count.

use std::collections::{BTreeMap, HashMap};
use tokio::sync::watch;

/// Published view: versionless URI -> default value
pub type RenderedNodes = BTreeMap<String, Option<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    pub value: Option<String>,
    pub count: usize,
}

#[derive(Debug)]
pub struct RenderedRegistry {
    entries: HashMap<String, RenderedEntry>,
    published: watch::Sender<RenderedNodes>,
}

impl Default for RenderedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderedRegistry {
    pub fn new() -> Self {
        let (published, _) = watch::channel(RenderedNodes::new());
        Self {
            entries: HashMap::new(),
            published,
        }
    }

    /// Count one more rendering of `uri`.
    ///
    /// The first reported value is kept. When a later report disagrees, the
    /// stored value is returned so the caller can warn about it.
    pub fn report(&mut self, uri: &str, value: Option<String>) -> Option<RenderedEntry> {
        if let Some(entry) = self.entries.get_mut(uri) {
            entry.count += 1;
            if entry.value != value {
                return Some(entry.clone());
            }
            return None;
        }

        self.entries.insert(
            uri.to_string(),
            RenderedEntry {
                value: value.clone(),
                count: 1,
            },
        );
        self.published.send_modify(|nodes| {
            nodes.insert(uri.to_string(), value);
        });
        None
    }

    /// Count one rendering less. Returns true when the entry is gone.
    pub fn remove(&mut self, uri: &str) -> bool {
        let Some(entry) = self.entries.get_mut(uri) else {
            return false;
        };

        entry.count = entry.count.saturating_sub(1);
        if entry.count > 0 {
            return false;
        }

        self.entries.remove(uri);
        self.published.send_modify(|nodes| {
            nodes.remove(uri);
        });
        true
    }

    #[cfg(test)]
    fn get(&self, uri: &str) -> Option<&RenderedEntry> {
        self.entries.get(uri)
    }

    /// Drop every entry and publish an empty map
    pub fn clear(&mut self) {
        self.entries.clear();
        self.published.send_replace(RenderedNodes::new());
    }

    pub fn snapshot(&self) -> RenderedNodes {
        self.published.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderedNodes> {
        self.published.subscribe()
    }
}
