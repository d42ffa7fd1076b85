//! The seam between the lifecycle pipeline and whatever owns the real nodes.
//!
//! A host supplies exactly the primitives boundary construction needs: an
//! isolated attachment root on an element, a parsed markup fragment, a style
//! node, and `append_child`. The in-memory [`Document`](crate::dom::Document)
//! is the reference implementation; the browser host lives in
//! `quetzal-platform`.

use std::fmt;

use thiserror::Error;

/// Whether the boundary is reachable from outside the element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryMode {
    #[default]
    Open,
    Closed,
}

impl BoundaryMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BoundaryMode::Open => "open",
            BoundaryMode::Closed => "closed",
        }
    }
}

impl fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("host environment is not available")]
    Unavailable,
    #[error("node already owns an encapsulation boundary")]
    BoundaryExists,
    #[error("node does not belong to this host")]
    UnknownNode,
    #[error("host error: {0}")]
    Platform(String),
}

/// Host primitives consumed by boundary construction.
///
/// Handles are cheap to clone and every method takes `&self`, so several
/// instances can hold the same host while their activations are suspended.
pub trait Host {
    type Node: Clone + fmt::Debug;

    /// Creates the isolated attachment root for `element`.
    fn attach_boundary(&self, element: &Self::Node, mode: BoundaryMode)
    -> Result<Self::Node, HostError>;

    /// Parses `markup` into a detached fragment node.
    fn parse_fragment(&self, markup: &str) -> Result<Self::Node, HostError>;

    /// Creates a detached `<style>` node holding `css` as its text.
    fn create_style(&self, css: &str) -> Result<Self::Node, HostError>;

    fn first_child(&self, node: &Self::Node) -> Option<Self::Node>;

    fn is_element(&self, node: &Self::Node) -> bool;

    /// Appends `child` to `parent`. Appending a fragment moves its children.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;
}
