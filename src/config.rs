//! Client configuration
//!
//! Every option has a built-in default; `ContentClient::reset_options`
//! restores exactly [`ClientOptions::default`].

use crate::render::{DefaultRenderer, Render};
use crate::uri::UriOptions;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Debounce window used unless configured otherwise
pub const DEFAULT_BATCH_INTERVAL: Duration = Duration::from_millis(10);

/// Endpoint receiving a `uri -> default` map
pub const LOAD_MANY_PATH: &str = "/djedi/load_many";

/// Endpoint receiving a list of URI prefixes
pub const LOAD_BY_PREFIX_PATH: &str = "/djedi/load_by_prefix";

/// Content client options
#[derive(Clone)]
pub struct ClientOptions {
    /// Prefix for the node endpoints (e.g., "https://cms.example.com")
    pub base_url: String,
    /// Debounce window for batched lookups. Zero disables batching.
    pub batch_interval: Duration,
    /// URI defaults and separators
    pub uri: UriOptions,
    /// Fallback rendering strategy
    pub renderer: Arc<dyn Render>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            batch_interval: DEFAULT_BATCH_INTERVAL,
            uri: UriOptions::default(),
            renderer: Arc::new(DefaultRenderer),
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_url", &self.base_url)
            .field("batch_interval", &self.batch_interval)
            .field("uri", &self.uri)
            .finish_non_exhaustive()
    }
}

impl ClientOptions {
    /// Defaults overridden by `DJEDI_BASE_URL` and `DJEDI_BATCH_INTERVAL_MS`
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(base_url) = std::env::var("DJEDI_BASE_URL") {
            options.base_url = base_url;
        }

        if let Ok(val) = std::env::var("DJEDI_BATCH_INTERVAL_MS") {
            match val.trim().parse::<i64>() {
                Ok(ms) => options.batch_interval = interval_from_millis(ms),
                Err(e) => tracing::warn!("Ignoring DJEDI_BATCH_INTERVAL_MS={:?}: {}", val, e),
            }
        }

        options
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_batch_interval(mut self, interval: Duration) -> Self {
        self.batch_interval = interval;
        self
    }

    /// Turn batching off; every lookup becomes its own request
    pub fn without_batching(mut self) -> Self {
        self.batch_interval = Duration::ZERO;
        self
    }

    pub fn with_uri_options(mut self, uri: UriOptions) -> Self {
        self.uri = uri;
        self
    }

    pub fn with_renderer(mut self, renderer: impl Render + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn batching_enabled(&self) -> bool {
        !self.batch_interval.is_zero()
    }

    /// Full URL for an endpoint path, without doubling the slash
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Millisecond interval where zero or negative means "disabled"
pub fn interval_from_millis(ms: i64) -> Duration {
    u64::try_from(ms).map(Duration::from_millis).unwrap_or(Duration::ZERO)
}
