//! Content client
//!
//! Single lookups, debounced batch lookups, prefix hydration and the
//! rendered-node registry, all over one shared cache.

mod content_client;

pub use content_client::{ContentClient, LoadResult};
