//! Batch queue for debounced lookups
//!
//! The queue is a plain owned value: a flush takes the whole queue out of
//! the client (`std::mem::take`) and leaves an empty one behind, so calls
//! that arrive while the request is in flight start a fresh batch.

use crate::error::Result;
use crate::node::Node;
use std::collections::HashMap;
use tokio::sync::oneshot;

/// One queued URI and everyone waiting for it
#[derive(Debug)]
pub struct PendingLookup {
    /// Requested node, URI already canonical
    pub node: Node,
    waiters: Vec<oneshot::Sender<Result<Node>>>,
}

impl PendingLookup {
    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }
}

#[derive(Debug, Default)]
pub struct BatchQueue {
    entries: HashMap<String, PendingLookup>,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a lookup for `node` (URI must be canonical).
    ///
    /// A URI that is already queued keeps its first node and gains a waiter.
    pub fn enqueue(&mut self, node: Node) -> oneshot::Receiver<Result<Node>> {
        let (tx, rx) = oneshot::channel();
        self.entries
            .entry(node.uri.clone())
            .or_insert_with(|| PendingLookup {
                node,
                waiters: Vec::new(),
            })
            .waiters
            .push(tx);
        rx
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.entries.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Callers waiting across every queued URI
    pub fn waiter_count(&self) -> usize {
        self.entries.values().map(PendingLookup::waiter_count).sum()
    }

    /// Queued nodes, one per URI
    pub fn nodes(&self) -> Vec<Node> {
        self.entries.values().map(|pending| pending.node.clone()).collect()
    }

    /// Answer every waiter. `resolve` runs once per queued URI.
    pub fn resolve_with<F>(self, mut resolve: F)
    where
        F: FnMut(&Node) -> Result<Node>,
    {
        for (_, pending) in self.entries {
            let result = resolve(&pending.node);
            for waiter in pending.waiters {
                // A dropped receiver just means the caller stopped waiting
                let _ = waiter.send(result.clone());
            }
        }
    }
}
