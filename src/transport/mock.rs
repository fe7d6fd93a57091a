//! In-memory node server for testing.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

use super::traits::*;
use crate::config::{LOAD_BY_PREFIX_PATH, LOAD_MANY_PATH};

/// A request seen by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Value,
}

impl RecordedRequest {
    /// Keys of a `load_many` body, sorted
    pub fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self
            .body
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        uris.sort();
        uris
    }
}

#[derive(Debug, Clone)]
enum Failure {
    Network(String),
    Body(u16, String),
    Response(TransportResponse),
}

/// Mock transport answering the node endpoints from a content table.
///
/// `load_many` returns the requested URIs present in the table and
/// `load_by_prefix` returns every entry starting with one of the prefixes.
/// A gate holds responses back until [`MockTransport::release`] is called.
#[derive(Default)]
pub struct MockTransport {
    content: Mutex<HashMap<String, Option<String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    failure: Mutex<Option<Failure>>,
    gate: Option<Arc<Semaphore>>,
    call_count: AtomicU32,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the content table.
    pub fn with_node(self, uri: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(uri, Some(value.into()));
        self
    }

    /// Hold every response until released.
    pub fn with_gate(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn insert(&self, uri: impl Into<String>, value: Option<String>) {
        lock(&self.content).insert(uri.into(), value);
    }

    /// Let `count` held responses through.
    pub fn release(&self, count: usize) {
        if let Some(ref gate) = self.gate {
            gate.add_permits(count);
        }
    }

    /// Fail every request without a response.
    pub fn fail_network(&self, reason: impl Into<String>) {
        *lock(&self.failure) = Some(Failure::Network(reason.into()));
    }

    /// Send `status`, then fail while the body is being read.
    pub fn fail_body(&self, status: u16, reason: impl Into<String>) {
        *lock(&self.failure) = Some(Failure::Body(status, reason.into()));
    }

    /// Answer every request with this status and body.
    pub fn respond_with(&self, status: u16, body: impl Into<String>) {
        *lock(&self.failure) = Some(Failure::Response(TransportResponse::new(status, body)));
    }

    /// Back to serving the content table.
    pub fn recover(&self) {
        *lock(&self.failure) = None;
    }

    /// Get the number of requests received.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    fn answer(&self, url: &str, body: &Value) -> Value {
        let content = lock(&self.content);
        let mut result = Map::new();

        if url.ends_with(LOAD_MANY_PATH) {
            if let Some(requested) = body.as_object() {
                for uri in requested.keys() {
                    if let Some(value) = content.get(uri) {
                        result.insert(uri.clone(), json_value(value));
                    }
                }
            }
        } else if url.ends_with(LOAD_BY_PREFIX_PATH) {
            let prefixes: Vec<&str> = body
                .as_array()
                .map(|items| items.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            for (uri, value) in content.iter() {
                if prefixes.iter().any(|prefix| uri.starts_with(prefix)) {
                    result.insert(uri.clone(), json_value(value));
                }
            }
        }

        Value::Object(result)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse, TransportError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(RecordedRequest {
            url: url.to_string(),
            body: body.clone(),
        });

        if let Some(ref gate) = self.gate {
            gate.acquire()
                .await
                .map_err(|e| TransportError::new(e.to_string()))?
                .forget();
        }

        let failure = lock(&self.failure).clone();
        match failure {
            Some(Failure::Network(reason)) => Err(TransportError::new(reason)),
            Some(Failure::Body(status, reason)) => Err(TransportError::after_response(status, reason)),
            Some(Failure::Response(response)) => Ok(response),
            None => Ok(TransportResponse::ok_json(&self.answer(url, body))),
        }
    }
}

fn json_value(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
