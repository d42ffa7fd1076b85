pub use crate::component::{Blank, Component, Hook, HookResult, RenderResult};
pub use crate::dom::{Document, NodeId};
pub use crate::element::{Capability, Element, Static, StaticElement, Stateful, StatefulElement};
pub use crate::error::{Error, RegistryError};
pub use crate::host::{BoundaryMode, Host, HostError};
pub use crate::instance::{AnyInstance, Instance};
pub use crate::lifecycle::LifecycleState;
pub use crate::registry::Registry;
