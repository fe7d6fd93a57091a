//! Batching, caching content client
//!
//! Resolves nodes against the Djedi node endpoints, keeps every resolved
//! node in memory and coalesces lookups made within the batch window into a
//! single `load_many` request.

use crate::cache::{BatchQueue, NodeCache, RenderedNodes, RenderedRegistry};
use crate::config::{ClientOptions, LOAD_BY_PREFIX_PATH, LOAD_MANY_PATH};
use crate::error::{ClientError, RequestContext, Result};
use crate::node::Node;
use crate::render::RenderState;
use crate::transport::{HttpTransport, Transport};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Raw server answer: URI (as sent back by the server) -> value
pub type LoadResult = HashMap<String, Option<String>>;

/// Content client for Djedi nodes.
///
/// Cheap to clone; clones share the same cache, batch queue and registry.
///
/// # Example
///
/// ```rust,ignore
/// use djedi_client::{ClientOptions, ContentClient, Node};
///
/// let client = ContentClient::new(
///     ClientOptions::default().with_base_url("https://cms.example.com"),
/// );
///
/// // Lookups issued within the batch window share one request
/// let (title, body) = tokio::join!(
///     client.get_batched(Node::with_default("home/title", "Welcome")),
///     client.get_batched("home/body.md"),
/// );
/// ```
#[derive(Clone)]
pub struct ContentClient {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    options: RwLock<ClientOptions>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    cache: NodeCache,
    rendered: RenderedRegistry,
    prefetch: HashMap<String, Node>,
    batch: BatchQueue,
    /// Pending flush timer; cleared the moment it fires
    timer: Option<JoinHandle<()>>,
    /// Bumped by `reset_nodes` so a timer from before the reset never flushes
    epoch: u64,
}

impl ContentClient {
    /// Create a client talking HTTP through reqwest
    pub fn new(options: ClientOptions) -> Self {
        Self::with_transport(options, Arc::new(HttpTransport::new()))
    }

    /// Create a client configured from `DJEDI_*` environment variables
    pub fn from_env() -> Self {
        Self::new(ClientOptions::from_env())
    }

    pub fn with_transport(options: ClientOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                options: RwLock::new(options),
                state: Mutex::new(State::default()),
            }),
        }
    }

    // === Options ===

    /// Snapshot of the current options
    pub fn options(&self) -> ClientOptions {
        self.read_options().clone()
    }

    pub fn set_options(&self, options: ClientOptions) {
        *self.inner.options.write().unwrap_or_else(PoisonError::into_inner) = options;
    }

    /// Restore every option to its built-in default
    pub fn reset_options(&self) {
        self.set_options(ClientOptions::default());
    }

    /// Canonical form of a URI under the current options
    pub fn canonical_uri(&self, uri: &str) -> String {
        self.read_options().uri.canonicalize(uri)
    }

    // === Lookups ===

    /// Cached node for `node`'s URI, if any. Never issues a request.
    pub fn get_cached(&self, node: impl Into<Node>) -> Option<Node> {
        let node = self.normalize(node.into());
        let state = self.state();
        state.cache.get(&node.uri).map(|cached| fill_default(cached, &node))
    }

    /// Resolve a single node.
    ///
    /// A cache hit completes on the first poll without touching the network.
    /// Otherwise a one-node `load_many` request is made.
    pub async fn get(&self, node: impl Into<Node>) -> Result<Node> {
        let node = self.normalize(node.into());
        if let Some(cached) = self.cached(&node) {
            return Ok(cached);
        }

        let result = self.load_canonical(std::slice::from_ref(&node)).await?;
        self.resolve(&result, &node)
    }

    /// Resolve a node through the shared batch.
    ///
    /// Lookups made within the batch window are sent as one request. With
    /// batching disabled this is [`ContentClient::get`].
    pub async fn get_batched(&self, node: impl Into<Node>) -> Result<Node> {
        let node = node.into();
        let interval = self.read_options().batch_interval;
        if interval.is_zero() {
            return self.get(node).await;
        }

        let node = self.normalize(node);
        let receiver = {
            let mut state = self.state();
            if let Some(cached) = state.cache.get(&node.uri) {
                trace!(uri = %node.uri, "Cache hit");
                return Ok(fill_default(cached, &node));
            }

            let receiver = state.batch.enqueue(node.clone());
            if state.timer.is_none() {
                self.schedule_flush(&mut state, interval);
            }
            receiver
        };

        receiver
            .await
            .unwrap_or_else(|_| Err(ClientError::Cancelled { uri: node.uri }))
    }

    // === Loading ===

    /// Load many nodes in one request and merge the answer into the cache.
    ///
    /// Returns the server's `uri -> value` map unchanged.
    pub async fn load_many(&self, nodes: &[Node]) -> Result<LoadResult> {
        let nodes: Vec<Node> = nodes.iter().cloned().map(|node| self.normalize(node)).collect();
        self.load_canonical(&nodes).await
    }

    /// Load every node whose URI starts with one of `prefixes`.
    ///
    /// Used to hydrate the cache with what a server-side render fetched.
    pub async fn load_by_prefix<S: AsRef<str>>(&self, prefixes: &[S]) -> Result<LoadResult> {
        if prefixes.is_empty() {
            return Ok(LoadResult::new());
        }

        let payload = Value::Array(
            prefixes
                .iter()
                .map(|prefix| Value::String(prefix.as_ref().to_string()))
                .collect(),
        );

        let result = self.post(LOAD_BY_PREFIX_PATH, payload).await?;
        self.merge(&result);
        Ok(result)
    }

    /// Put nodes into the cache without a request
    pub fn inject_nodes<I>(&self, nodes: I)
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        let result: LoadResult = nodes.into_iter().collect();
        self.merge(&result);
    }

    // === Prefetching ===

    /// Remember a node to load with the next [`ContentClient::prefetch`]
    pub fn report_prefetchable_node(&self, node: impl Into<Node>) {
        let node = self.normalize(node.into());
        self.state().prefetch.entry(node.uri.clone()).or_insert(node);
    }

    /// Load every reported prefetchable node (plus `extra`) not yet cached,
    /// in a single request.
    pub async fn prefetch(&self, extra: &[Node]) -> Result<LoadResult> {
        let extra: Vec<Node> = extra.iter().cloned().map(|node| self.normalize(node)).collect();

        let nodes: Vec<Node> = {
            let state = self.state();
            let mut wanted: HashMap<String, Node> = HashMap::new();
            for node in state.prefetch.values().chain(extra.iter()) {
                if !state.cache.contains(&node.uri) {
                    wanted.entry(node.uri.clone()).or_insert_with(|| node.clone());
                }
            }
            wanted.into_values().collect()
        };

        debug!(count = nodes.len(), "Prefetching nodes");
        self.load_canonical(&nodes).await
    }

    // === Rendered nodes ===

    /// Record that a node is on screen.
    ///
    /// Rendering the same URI again only bumps its count. If the second
    /// report carries a different default, the first one is kept.
    pub fn report_rendered_node(&self, node: impl Into<Node>) {
        let node = node.into();
        let uri = self.read_options().uri.versionless(&node.uri);

        let mut state = self.state();
        if let Some(previous) = state.rendered.report(&uri, node.value.clone()) {
            warn!(
                uri = %uri,
                kept = ?previous.value,
                ignored = ?node.value,
                "Node rendered with a different default value; keeping the first"
            );
        }
    }

    /// Record that one rendering of `uri` went away
    pub fn report_removed_node(&self, uri: &str) {
        let uri = self.read_options().uri.versionless(uri);
        if self.state().rendered.remove(&uri) {
            trace!(uri = %uri, "Node no longer rendered");
        }
    }

    /// Currently rendered nodes: versionless URI -> default value
    pub fn rendered_nodes(&self) -> RenderedNodes {
        self.state().rendered.snapshot()
    }

    /// Watch the rendered-node map (e.g., from an admin overlay)
    pub fn subscribe_rendered(&self) -> watch::Receiver<RenderedNodes> {
        self.state().rendered.subscribe()
    }

    // === Reset ===

    /// Forget every node.
    ///
    /// Cancels a batch whose timer has not fired yet (its callers get
    /// [`ClientError::Cancelled`]), clears the cache, the prefetch set and
    /// the rendered-node registry, and publishes an empty rendered map.
    /// A request already in flight still completes and answers its callers.
    pub fn reset_nodes(&self) {
        let cancelled = {
            let mut state = self.state();
            state.epoch = state.epoch.wrapping_add(1);
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.cache.clear();
            state.prefetch.clear();
            state.rendered.clear();
            std::mem::take(&mut state.batch)
        };

        if !cancelled.is_empty() {
            debug!(count = cancelled.len(), "Cancelling pending batch");
        }
        cancelled.resolve_with(|node| Err(ClientError::Cancelled { uri: node.uri.clone() }));
    }

    // === Rendering ===

    /// Fallback for a render state, from the configured renderer
    pub fn render(&self, state: RenderState<'_>) -> Option<String> {
        let renderer = self.read_options().renderer.clone();
        renderer.render(state)
    }

    /// Fallback for a finished lookup
    pub fn render_result(&self, result: &Result<Node>) -> Option<String> {
        self.render(RenderState::from_result(result))
    }

    // === Private Implementation ===

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_options(&self) -> RwLockReadGuard<'_, ClientOptions> {
        self.inner.options.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn normalize(&self, node: Node) -> Node {
        Node {
            uri: self.canonical_uri(&node.uri),
            value: node.value,
        }
    }

    fn cached(&self, node: &Node) -> Option<Node> {
        let state = self.state();
        let cached = state.cache.get(&node.uri)?;
        trace!(uri = %node.uri, "Cache hit");
        Some(fill_default(cached, node))
    }

    fn schedule_flush(&self, state: &mut State, interval: Duration) {
        let epoch = state.epoch;
        let client = self.clone();
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            client.flush(epoch).await;
        }));
    }

    /// Send the queued batch. The queue is swapped out first so lookups made
    /// while the request is in flight go into a new batch.
    async fn flush(&self, epoch: u64) {
        let queue = {
            let mut state = self.state();
            if state.epoch != epoch {
                return;
            }
            state.timer = None;
            std::mem::take(&mut state.batch)
        };

        if queue.is_empty() {
            return;
        }

        let nodes = queue.nodes();
        debug!(count = nodes.len(), waiters = queue.waiter_count(), "Flushing node batch");

        let result = self.load_canonical(&nodes).await;
        if let Err(ref e) = result {
            warn!(count = nodes.len(), status = e.status(), "Batched node request failed: {}", e);
        }

        queue.resolve_with(|node| match result {
            Ok(ref loaded) => self.resolve(loaded, node),
            Err(ref e) => Err(e.clone()),
        });
    }

    /// `load_many` for nodes whose URIs are already canonical
    async fn load_canonical(&self, nodes: &[Node]) -> Result<LoadResult> {
        if nodes.is_empty() {
            return Ok(LoadResult::new());
        }

        let mut payload = Map::new();
        for node in nodes {
            payload
                .entry(node.uri.clone())
                .or_insert_with(|| node.value.clone().map(Value::String).unwrap_or(Value::Null));
        }

        let result = self.post(LOAD_MANY_PATH, Value::Object(payload)).await?;
        self.merge(&result);
        Ok(result)
    }

    async fn post(&self, path: &str, payload: Value) -> Result<LoadResult> {
        let url = self.read_options().endpoint(path);
        let mut context = RequestContext::new(url.clone(), payload.to_string());
        debug!(url = %url, "Requesting nodes");

        let response = match self.inner.transport.post_json(&url, &payload).await {
            Ok(response) => response,
            Err(e) => {
                // A response arrived, its body just could not be read
                if let Some(status) = e.status {
                    context.status = Some(status);
                    return Err(ClientError::Parse {
                        reason: e.message,
                        context,
                    });
                }
                return Err(ClientError::Transport {
                    reason: e.message,
                    context,
                });
            }
        };

        context.status = Some(response.status);
        context.text = Some(response.body.clone());

        if !(200..400).contains(&response.status) {
            return Err(ClientError::Status {
                status: response.status,
                context,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| ClientError::Parse {
            reason: e.to_string(),
            context,
        })
    }

    fn merge(&self, result: &LoadResult) {
        let nodes: Vec<Node> = {
            let options = self.read_options();
            result
                .iter()
                .map(|(uri, value)| Node {
                    uri: options.uri.canonicalize(uri),
                    value: value.clone(),
                })
                .collect()
        };

        let mut state = self.state();
        for node in nodes {
            state.cache.insert(node);
        }
    }

    /// Pick the answer for `requested` out of a load result.
    ///
    /// Exact URI first; an unversioned request also accepts a versioned
    /// answer for the same node.
    fn resolve(&self, result: &LoadResult, requested: &Node) -> Result<Node> {
        let found = {
            let options = self.read_options();
            let uri_options = &options.uri;

            let exact = result.iter().find(|(uri, _)| uri_options.canonicalize(uri) == requested.uri);
            let unversioned = uri_options.parse(&requested.uri).version.is_none();

            exact
                .or_else(|| {
                    if !unversioned {
                        return None;
                    }
                    result
                        .iter()
                        .find(|(uri, _)| uri_options.versionless(uri) == requested.uri)
                })
                .map(|(uri, value)| Node {
                    uri: uri_options.canonicalize(uri),
                    value: value.clone(),
                })
        };

        let Some(node) = found else {
            return Err(ClientError::Missing {
                uri: requested.uri.clone(),
            });
        };

        if node.uri != requested.uri {
            self.state().cache.insert_as(requested.uri.clone(), node.clone());
        }
        Ok(fill_default(&node, requested))
    }
}

/// Cached/server node, falling back to the requested default for a null value
fn fill_default(resolved: &Node, requested: &Node) -> Node {
    Node {
        uri: resolved.uri.clone(),
        value: resolved.value.clone().or_else(|| requested.value.clone()),
    }
}
