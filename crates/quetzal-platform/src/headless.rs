//! Headless host environment.
//!
//! Plays the browser's part for components rendered into an in-memory
//! [`Document`]: upgrades registered elements, schedules their activation on
//! one task queue, and turns tree insertions/removals into
//! `connected`/`disconnected` signals. Failures land in an error channel
//! instead of a console.
//!
//! Signals follow the composed tree: elements rendered inside a component's
//! boundary are upgraded once that boundary is built, and they see insertions
//! and removals of their host.
//!
//! ```rust
//! use quetzal_core::prelude::*;
//! use quetzal_platform::{Headless, HeadlessOptions};
//!
//! #[derive(Default)]
//! struct Hello;
//!
//! impl Component for Hello {
//!     fn render(&self) -> RenderResult {
//!         Ok("<p>hello</p>".into())
//!     }
//! }
//!
//! let mut env = Headless::new(HeadlessOptions::default());
//! env.registry_mut().define::<Hello>("x-hello").unwrap();
//!
//! let node = env.create_element("x-hello");
//! env.append_to_body(node).unwrap();
//! env.run_until_stalled();
//!
//! assert_eq!(env.state(node), Some(LifecycleState::Mounted));
//! assert_eq!(
//!     env.document().boundary_html(node).as_deref(),
//!     Some("<p>hello<style></style></p>")
//! );
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

use quetzal_core::dom::{Document, NodeId, NodeKind};
use quetzal_core::{AnyInstance, BoundaryMode, Error, HostError, LifecycleState, Registry};

use crate::describe;

#[derive(Clone, Debug, Default)]
pub struct HeadlessOptions {
    pub boundary_mode: BoundaryMode,
    /// Installs `env_logger` with this default filter when set.
    pub log_filter: Option<String>,
}

/// A lifecycle step that failed, as reported to the host.
#[derive(Debug)]
pub struct Failure {
    pub tag: Rc<str>,
    pub node: NodeId,
    pub error: Error,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {}", self.tag, self.error)
    }
}

type ErrorChannel = Rc<RefCell<Vec<Failure>>>;

/// Instances are kept for as long as the runner lives, including those of
/// elements that were removed and never inserted again. Meant for tests and
/// short-lived renders.
pub struct Headless {
    document: Document,
    registry: Registry<Document>,
    instances: HashMap<NodeId, Box<dyn AnyInstance<Document>>>,
    pool: LocalPool,
    spawner: LocalSpawner,
    errors: ErrorChannel,
    // Hosts whose activation finished since the last drain.
    settled: Rc<RefCell<Vec<NodeId>>>,
}

impl Default for Headless {
    fn default() -> Self {
        Self::new(HeadlessOptions::default())
    }
}

impl fmt::Debug for Headless {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Headless")
            .field("registry", &self.registry)
            .field("instances", &self.instances.len())
            .field("errors", &self.errors.borrow().len())
            .finish()
    }
}

impl Headless {
    pub fn new(options: HeadlessOptions) -> Self {
        if let Some(filter) = &options.log_filter {
            crate::init_logging(filter);
        }
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            document: Document::new(),
            registry: Registry::new().with_mode(options.boundary_mode),
            instances: HashMap::new(),
            pool,
            spawner,
            errors: Rc::new(RefCell::new(Vec::new())),
            settled: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &Registry<Document> {
        &self.registry
    }

    /// Definitions only affect elements created or inserted afterwards.
    pub fn registry_mut(&mut self) -> &mut Registry<Document> {
        &mut self.registry
    }

    /// Creates an element, upgrading it if its tag is defined.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let node = self.document.create_element(tag);
        self.upgrade(node);
        node
    }

    pub fn append_to_body(&mut self, child: NodeId) -> Result<(), HostError> {
        let body = self.document.body();
        self.append_child(body, child)
    }

    /// Inserts `child` under `parent`.
    ///
    /// Defined elements in the inserted subtree are upgraded first. Every
    /// upgraded element that was already connected sees a removal, then every
    /// one that is connected afterwards sees an insertion, as a DOM move would.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        let roots = match self.document.kind(child) {
            Some(NodeKind::Fragment) => self.document.children(child),
            Some(_) => vec![child],
            None => return Err(HostError::UnknownNode),
        };

        let subtree = self.composed(&roots);
        for &node in &subtree {
            self.upgrade(node);
        }

        let moved: Vec<NodeId> = self.connected_instances(&subtree);
        self.document.append_child(parent, child)?;

        for &node in &moved {
            self.signal(node, false);
        }
        for node in self.connected_instances(&subtree) {
            self.signal(node, true);
        }
        Ok(())
    }

    /// Detaches `node`; connected upgraded elements below it, boundaries
    /// included, see a removal.
    pub fn remove(&mut self, node: NodeId) -> Result<(), HostError> {
        let subtree = self.composed(&[node]);
        let leaving = self.connected_instances(&subtree);
        self.document.remove(node)?;
        for node in leaving {
            self.signal(node, false);
        }
        Ok(())
    }

    /// Runs queued activations until all of them are done or waiting.
    ///
    /// Defined elements inside freshly built boundaries are upgraded and
    /// activated in the same call.
    pub fn run_until_stalled(&mut self) {
        loop {
            self.pool.run_until_stalled();
            let settled = std::mem::take(&mut *self.settled.borrow_mut());
            if settled.is_empty() {
                break;
            }
            for host in settled {
                let Some(boundary) = self.document.boundary_of(host) else {
                    continue;
                };
                let inner = self.composed(&[boundary]);
                for &node in &inner {
                    self.upgrade(node);
                }
                for node in self.connected_instances(&inner) {
                    self.signal(node, true);
                }
            }
        }
    }

    pub fn instance(&self, node: NodeId) -> Option<&dyn AnyInstance<Document>> {
        self.instances.get(&node).map(|i| i.as_ref())
    }

    pub fn state(&self, node: NodeId) -> Option<LifecycleState> {
        self.instance(node).map(|i| i.state())
    }

    /// Drains the error channel.
    pub fn take_errors(&mut self) -> Vec<Failure> {
        std::mem::take(&mut *self.errors.borrow_mut())
    }

    fn upgrade(&mut self, node: NodeId) {
        if self.instances.contains_key(&node) {
            return;
        }
        let Some(tag) = self.document.tag_name(node) else {
            return;
        };
        let Ok(instance) = self.registry.create(&tag, self.document.clone(), node) else {
            return;
        };

        let activation = instance.activate();
        let errors = self.errors.clone();
        let settled = self.settled.clone();
        let name = instance.tag();
        let scheduled = self.spawner.spawn_local(async move {
            if let Err(error) = activation.await {
                report(&errors, name, node, error);
            }
            settled.borrow_mut().push(node);
        });
        if let Err(e) = scheduled {
            log::error!("<{tag}> could not schedule activation: {e}");
        }
        log::debug!("<{tag}> upgraded");
        self.instances.insert(node, instance);
    }

    /// `roots` and everything below them, entering built boundaries.
    fn composed(&self, roots: &[NodeId]) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut pending: VecDeque<NodeId> = roots.iter().copied().collect();
        while let Some(root) = pending.pop_front() {
            for node in self.document.descendants(root) {
                if let Some(boundary) = self.document.boundary_of(node) {
                    pending.push_back(boundary);
                }
                out.push(node);
            }
        }
        out
    }

    fn connected_instances(&self, nodes: &[NodeId]) -> Vec<NodeId> {
        nodes
            .iter()
            .copied()
            .filter(|n| self.instances.contains_key(n) && self.document.is_connected(*n))
            .collect()
    }

    fn signal(&self, node: NodeId, connected: bool) {
        let Some(instance) = self.instances.get(&node) else {
            return;
        };
        let result = if connected {
            instance.connected()
        } else {
            instance.disconnected()
        };
        if let Err(error) = result {
            report(&self.errors, instance.tag(), node, error);
        }
    }
}

fn report(errors: &ErrorChannel, tag: Rc<str>, node: NodeId, error: Error) {
    let failure = Failure { tag, node, error };
    log::error!("<{}> {}", failure.tag, describe(&failure.error));
    errors.borrow_mut().push(failure);
}
