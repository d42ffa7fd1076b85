use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::component::{Component, Hook};
use crate::element::{Capability, Element, Static, Stateful};
use crate::error::{Error, Result};
use crate::host::{BoundaryMode, Host};
use crate::lifecycle::LifecycleState;

/// A component bound to a host element.
///
/// Construction is two-phase: [`Instance::new`] only allocates, and the host
/// drives [`Instance::activate`] to build the boundary. The handle is cheap to
/// clone; all clones refer to the same instance.
pub struct Instance<C: Component, H: Host, K: Capability = Stateful> {
    inner: Rc<Inner<C, H, K>>,
}

struct Inner<C, H: Host, K: Capability> {
    tag: RefCell<Rc<str>>,
    host: H,
    element: Element<H::Node, K>,
    mode: Cell<BoundaryMode>,
    component: RefCell<C>,
    state: Cell<LifecycleState>,
    // Last insertion signal from the host, replayed once creation finishes.
    connected: Cell<bool>,
    boundary: RefCell<Option<H::Node>>,
}

impl<C: Component, H: Host> Instance<C, H, Stateful> {
    pub fn new(component: C, host: H, node: H::Node) -> Self {
        Self::with_element(component, host, Element::new(node))
    }
}

impl<C: Component, H: Host> Instance<C, H, Static> {
    pub fn new_static(component: C, host: H, node: H::Node) -> Self {
        Self::with_element(component, host, Element::new(node))
    }
}

impl<C: Component, H: Host, K: Capability> Instance<C, H, K> {
    pub fn with_element(component: C, host: H, element: Element<H::Node, K>) -> Self {
        Self {
            inner: Rc::new(Inner {
                tag: RefCell::new(default_tag::<C>().into()),
                host,
                element,
                mode: Cell::new(BoundaryMode::default()),
                component: RefCell::new(component),
                state: Cell::new(LifecycleState::Unattached),
                connected: Cell::new(false),
                boundary: RefCell::new(None),
            }),
        }
    }

    /// Name used in log lines and traces.
    pub fn with_tag(self, tag: impl Into<Rc<str>>) -> Self {
        *self.inner.tag.borrow_mut() = tag.into();
        self
    }

    /// Only meaningful before activation.
    pub fn with_mode(self, mode: BoundaryMode) -> Self {
        self.inner.mode.set(mode);
        self
    }

    pub fn tag(&self) -> Rc<str> {
        self.inner.tag.borrow().clone()
    }

    pub fn mode(&self) -> BoundaryMode {
        self.inner.mode.get()
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.state.get()
    }

    /// Whether the host currently considers the element inserted.
    pub fn is_connected(&self) -> bool {
        self.inner.connected.get()
    }

    pub fn element(&self) -> &Element<H::Node, K> {
        &self.inner.element
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn boundary(&self) -> Option<H::Node> {
        self.inner.boundary.borrow().clone()
    }

    /// Reads the component. Returns `None` while `before_created` is pending,
    /// since the suspended activation holds it.
    pub fn with_component<R>(&self, f: impl FnOnce(&C) -> R) -> Option<R> {
        self.inner.component.try_borrow().ok().map(|c| f(&c))
    }

    /// Builds the encapsulation boundary.
    ///
    /// Awaits `before_created`, then attaches the rendered markup and styles
    /// and runs `created`. A second call fails with
    /// [`Error::AlreadyActivated`] and leaves the instance untouched.
    // Host signals that arrive while this is suspended only touch `connected`
    // and `state`, never the component.
    #[allow(clippy::await_holding_refcell_ref)]
    pub async fn activate(&self) -> Result<()> {
        let state = self.state();
        if state != LifecycleState::Unattached {
            log::warn!("<{}> activate called while {state}", self.tag());
            return Err(Error::AlreadyActivated { state });
        }
        self.set_state(LifecycleState::Initializing);

        let mut component = self.inner.component.borrow_mut();

        log::debug!("<{}> {}", self.tag(), Hook::BeforeCreated);
        if let Err(source) = component.before_created().await {
            return Err(self.fail(Error::hook(Hook::BeforeCreated, source)));
        }

        if let Err(err) = self.build_boundary(&component) {
            return Err(self.fail(err));
        }

        log::debug!("<{}> {}", self.tag(), Hook::Created);
        if let Err(source) = component.created() {
            return Err(self.fail(Error::hook(Hook::Created, source)));
        }
        self.set_state(LifecycleState::Created);
        drop(component);

        if self.is_connected() {
            self.mount()?;
        }
        Ok(())
    }

    /// Host insertion signal.
    pub fn connected(&self) -> Result<()> {
        match self.state() {
            LifecycleState::Unattached | LifecycleState::Initializing => {
                log::debug!("<{}> inserted before creation; deferring mount", self.tag());
                self.inner.connected.set(true);
                Ok(())
            }
            LifecycleState::Created | LifecycleState::Unmounted => {
                self.inner.connected.set(true);
                self.mount()
            }
            LifecycleState::Mounted => {
                log::warn!("<{}> insertion signal while already mounted", self.tag());
                Ok(())
            }
            LifecycleState::Failed => {
                log::warn!("<{}> insertion signal ignored, creation failed", self.tag());
                self.inner.connected.set(true);
                Ok(())
            }
        }
    }

    /// Host removal signal.
    pub fn disconnected(&self) -> Result<()> {
        self.inner.connected.set(false);
        match self.state() {
            LifecycleState::Mounted => {
                self.set_state(LifecycleState::Unmounted);
                log::debug!("<{}> {}", self.tag(), Hook::Unmounted);
                self.inner
                    .component
                    .borrow_mut()
                    .unmounted()
                    .map_err(|source| Error::hook(Hook::Unmounted, source))
            }
            state => {
                log::debug!("<{}> removal signal while {state}; nothing to unmount", self.tag());
                Ok(())
            }
        }
    }

    fn mount(&self) -> Result<()> {
        self.set_state(LifecycleState::Mounted);
        log::debug!("<{}> {}", self.tag(), Hook::Mounted);
        self.inner
            .component
            .borrow_mut()
            .mounted()
            .map_err(|source| Error::hook(Hook::Mounted, source))
    }

    fn build_boundary(&self, component: &C) -> Result<()> {
        let host = &self.inner.host;

        let boundary = host.attach_boundary(self.inner.element.node(), self.mode())?;
        *self.inner.boundary.borrow_mut() = Some(boundary.clone());

        log::debug!("<{}> {}", self.tag(), Hook::Render);
        let markup = component.render().map_err(Error::Render)?;
        let content = host.parse_fragment(&markup)?;
        let style = host.create_style(component.styles())?;

        // The style lives inside the first rendered element so it travels
        // with the content; a fragment without one keeps it at the top level.
        let style_parent = match host.first_child(&content) {
            Some(first) if host.is_element(&first) => first,
            _ => content.clone(),
        };
        host.append_child(&style_parent, &style)?;
        host.append_child(&boundary, &content)?;
        Ok(())
    }

    fn set_state(&self, next: LifecycleState) {
        let prev = self.inner.state.replace(next);
        debug_assert!(
            prev.can_transition_to(next),
            "illegal lifecycle transition {prev} -> {next}"
        );
        log::debug!("<{}> {prev} -> {next}", self.tag());
    }

    fn fail(&self, err: Error) -> Error {
        log::debug!("<{}> creation failed: {err}", self.tag());
        self.set_state(LifecycleState::Failed);
        err
    }
}

impl<C: Component, H: Host, K: Capability> Clone for Instance<C, H, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Component, H: Host, K: Capability> fmt::Debug for Instance<C, H, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("tag", &self.tag())
            .field("state", &self.state())
            .field("element", &self.inner.element)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

fn default_tag<C>() -> &'static str {
    let full = std::any::type_name::<C>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Type-erased [`Instance`], as stored by a host environment.
pub trait AnyInstance<H: Host> {
    fn tag(&self) -> Rc<str>;
    fn state(&self) -> LifecycleState;
    fn is_connected(&self) -> bool;
    fn boundary(&self) -> Option<H::Node>;
    fn activate(&self) -> LocalBoxFuture<'static, Result<()>>;
    fn connected(&self) -> Result<()>;
    fn disconnected(&self) -> Result<()>;
}

impl<C, H, K> AnyInstance<H> for Instance<C, H, K>
where
    C: Component,
    H: Host + 'static,
    H::Node: 'static,
    K: Capability,
{
    fn tag(&self) -> Rc<str> {
        Instance::tag(self)
    }

    fn state(&self) -> LifecycleState {
        Instance::state(self)
    }

    fn is_connected(&self) -> bool {
        Instance::is_connected(self)
    }

    fn boundary(&self) -> Option<H::Node> {
        Instance::boundary(self)
    }

    fn activate(&self) -> LocalBoxFuture<'static, Result<()>> {
        let this = self.clone();
        async move { Instance::activate(&this).await }.boxed_local()
    }

    fn connected(&self) -> Result<()> {
        Instance::connected(self)
    }

    fn disconnected(&self) -> Result<()> {
        Instance::disconnected(self)
    }
}
