//! # Components, boundaries, and the creation lifecycle
//!
//! Quetzal components render a complete markup string into an encapsulation
//! boundary (a shadow root) that they own exclusively. There are three pieces:
//!
//! - [`Component`]: the author's type, with `render`, optional `styles`, and
//!   optional lifecycle hooks with no-op defaults.
//! - [`Instance`]: a component bound to a host element. Allocation and
//!   activation are separate steps.
//! - [`Host`]: whatever owns the actual nodes. [`dom::Document`] is the
//!   in-memory one; the browser host lives in `quetzal-platform`.
//!
//! ## Lifecycle
//!
//! ```text
//! Unattached -> Initializing -> Created -> Mounted <-> Unmounted
//!                    \
//!                     -> Failed
//! ```
//!
//! `activate` runs `before_created` and waits for it. Only then is the
//! boundary created, `render` called (once, ever), the styles attached, and
//! `created` invoked. Insertion and removal signals from the host map to
//! `mounted` / `unmounted`; an insertion that arrives while the instance is
//! still initializing is held back until `created` has run.
//!
//! ```rust
//! use quetzal_core::*;
//! use quetzal_core::dom::Document;
//!
//! struct Greeting;
//!
//! impl Component for Greeting {
//!     fn render(&self) -> RenderResult {
//!         Ok("<p>hi</p>".into())
//!     }
//!
//!     fn styles(&self) -> &str {
//!         "p{color:red}"
//!     }
//! }
//!
//! let doc = Document::new();
//! let node = doc.create_element("x-greeting");
//! let instance = Instance::new(Greeting, doc.clone(), node);
//!
//! pollster::block_on(instance.activate()).unwrap();
//! assert_eq!(
//!     doc.boundary_html(node).unwrap(),
//!     "<p>hi<style>p{color:red}</style></p>"
//! );
//!
//! instance.connected().unwrap();
//! assert_eq!(instance.state(), LifecycleState::Mounted);
//! ```
//!
//! ## Failure
//!
//! Hook errors are not caught or retried. They come back to whoever drove the
//! step as [`Error`], and a failed creation leaves the instance in
//! [`LifecycleState::Failed`] for good. Other instances are unaffected.
//!
//! A `before_created` that never resolves stalls that instance forever; there
//! is no timeout and no cancellation.

pub mod component;
pub mod dom;
pub mod element;
pub mod error;
pub mod host;
pub mod instance;
pub mod lifecycle;
pub mod prelude;
pub mod registry;

pub use component::*;
pub use element::*;
pub use error::{Error, RegistryError};
pub use host::*;
pub use instance::*;
pub use lifecycle::*;
pub use registry::*;
