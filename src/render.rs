//! Fallback rendering
//!
//! A [`Render`] strategy turns the state of a lookup into something a page
//! can show. The client holds one in its options; [`DefaultRenderer`] is
//! used unless another is configured.

use crate::error::{ClientError, Result};
use crate::node::Node;
use std::fmt;

/// State of a node lookup as seen by a renderer
#[derive(Debug, Clone, Copy)]
pub enum RenderState<'a> {
    /// Request still pending
    Loading,
    /// Request failed
    Error(&'a ClientError),
    /// Value resolved
    Success(&'a str),
    /// Server answered without this node
    Missing,
}

impl<'a> RenderState<'a> {
    /// Map a finished lookup to its render state
    pub fn from_result(result: &'a Result<Node>) -> Self {
        match result {
            Ok(node) => RenderState::Success(node.value.as_deref().unwrap_or_default()),
            Err(err) if err.is_missing() => RenderState::Missing,
            Err(err) => RenderState::Error(err),
        }
    }
}

/// Strategy producing the displayed fallback for each render state
pub trait Render: Send + Sync {
    fn render(&self, state: RenderState<'_>) -> Option<String>;
}

/// Built-in renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRenderer;

impl Render for DefaultRenderer {
    fn render(&self, state: RenderState<'_>) -> Option<String> {
        match state {
            RenderState::Loading => Some("Loading…".to_string()),
            RenderState::Error(err) => Some(format!("Failed to fetch content 😞 ({})", err.status())),
            RenderState::Success(content) => Some(content.to_string()),
            RenderState::Missing => None,
        }
    }
}

/// Renderer built from a plain function
pub struct FnRenderer<F>(pub F);

impl<F> Render for FnRenderer<F>
where
    F: Fn(RenderState<'_>) -> Option<String> + Send + Sync,
{
    fn render(&self, state: RenderState<'_>) -> Option<String> {
        (self.0)(state)
    }
}

impl<F> fmt::Debug for FnRenderer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnRenderer")
    }
}
