//! In-memory state owned by the content client
//!
//! - `NodeCache`: resolved nodes by canonical URI
//! - `BatchQueue`: lookups waiting for the next batched request
//! - `RenderedRegistry`: reference-counted record of rendered nodes, mirrored
//!   into a watch channel for admin tooling

mod batch;
mod node_cache;
mod rendered;

pub use batch::{BatchQueue, PendingLookup};
pub use node_cache::NodeCache;
pub use rendered::{RenderedEntry, RenderedNodes, RenderedRegistry};
