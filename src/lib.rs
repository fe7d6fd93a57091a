//! Djedi client - batching, caching node lookups
//!
//! Client-side data layer for the Djedi CMS. Content is addressed by node
//! URIs (`i18n://en-us@home/title.txt#2`) and fetched from two endpoints on
//! the CMS server:
//!
//! - `POST {base_url}/djedi/load_many` with a `uri -> default` map
//! - `POST {base_url}/djedi/load_by_prefix` with a list of URI prefixes
//!
//! # Architecture
//!
//! - **URIs**: partial URIs are normalized against configurable defaults,
//!   including a per-scheme default namespace
//! - **Cache**: every resolved node is kept until `reset_nodes`
//! - **Batching**: lookups within the batch window (10 ms by default) are
//!   coalesced into one `load_many` request
//! - **Rendered nodes**: a reference-counted registry of what is on screen,
//!   published through a watch channel for admin tooling
//!
//! # Example
//!
//! ```rust,ignore
//! use djedi_client::{ClientOptions, ContentClient, Node};
//!
//! let client = ContentClient::new(
//!     ClientOptions::default().with_base_url("https://cms.example.com"),
//! );
//!
//! let node = client.get_batched(Node::with_default("home/title", "Welcome")).await?;
//! client.report_rendered_node(node.clone());
//! ```

// URI model
pub mod uri;

// Nodes
pub mod node;

// Options and endpoints
pub mod config;

// Fallback rendering strategy
pub mod render;

// HTTP seam
pub mod transport;

// Cache, batch queue, rendered registry
pub mod cache;

// Content client
pub mod client;

// Error types
pub mod error;

// Re-export client types
pub use client::{ContentClient, LoadResult};

// Re-export configuration
pub use config::{ClientOptions, DEFAULT_BATCH_INTERVAL, LOAD_BY_PREFIX_PATH, LOAD_MANY_PATH};

// Re-export data types
pub use cache::RenderedNodes;
pub use node::Node;
pub use uri::{Uri, UriDefaults, UriOptions, UriSeparators};

// Re-export rendering
pub use render::{DefaultRenderer, FnRenderer, Render, RenderState};

// Re-export transports
pub use transport::{HttpTransport, MockTransport, Transport, TransportError, TransportResponse};

// Re-export error types
pub use error::{ClientError, RequestContext, Result, MISSING_STATUS, NO_RESPONSE_STATUS};
