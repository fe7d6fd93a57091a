//! Transport layer for the node endpoints.
//!
//! The client only needs "POST this JSON, give me status and body":
//! - `HttpTransport` talks to a real server through reqwest
//! - `MockTransport` is an in-memory server for tests and offline use

pub mod http;
pub mod mock;
pub mod traits;

pub use http::HttpTransport;
pub use mock::{MockTransport, RecordedRequest};
pub use traits::{Transport, TransportError, TransportResponse};
