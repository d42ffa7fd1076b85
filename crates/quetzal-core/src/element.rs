use std::fmt;
use std::marker::PhantomData;

mod sealed {
    pub trait Sealed {}
}

/// Capability marker carried by an [`Element`].
///
/// Advisory only: nothing in the lifecycle pipeline checks it.
pub trait Capability: sealed::Sealed + 'static {
    const STATEFUL: bool;
    const NAME: &'static str;
}

/// May hold internal mutable state.
#[derive(Debug, Clone, Copy)]
pub enum Stateful {}

/// Display-only content, e.g. rendered markdown.
#[derive(Debug, Clone, Copy)]
pub enum Static {}

impl sealed::Sealed for Stateful {}
impl sealed::Sealed for Static {}

impl Capability for Stateful {
    const STATEFUL: bool = true;
    const NAME: &'static str = "stateful";
}

impl Capability for Static {
    const STATEFUL: bool = false;
    const NAME: &'static str = "static";
}

/// Something that can be inserted into a host document and later own an
/// encapsulation boundary.
pub struct Element<N, K: Capability = Stateful> {
    node: N,
    _kind: PhantomData<K>,
}

impl<N, K: Capability> Element<N, K> {
    /// Wraps a host node. Never touches the node itself.
    pub fn new(node: N) -> Self {
        Self {
            node,
            _kind: PhantomData,
        }
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn is_stateful(&self) -> bool {
        K::STATEFUL
    }

    pub fn into_node(self) -> N {
        self.node
    }
}

impl<N: Clone, K: Capability> Clone for Element<N, K> {
    fn clone(&self) -> Self {
        Self::new(self.node.clone())
    }
}

impl<N: fmt::Debug, K: Capability> fmt::Debug for Element<N, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("node", &self.node)
            .field("kind", &K::NAME)
            .finish()
    }
}

pub type StatefulElement<N> = Element<N, Stateful>;
pub type StaticElement<N> = Element<N, Static>;
