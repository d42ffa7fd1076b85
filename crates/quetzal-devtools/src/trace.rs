use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Serialize, Serializer};
use web_time::Instant;

use quetzal_core::{Component, Hook, HookResult, Host, Registry, RegistryError, RenderResult};

/// One finished hook call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceEvent {
    pub tag: String,
    #[serde(serialize_with = "hook_name")]
    pub hook: Hook,
    pub ok: bool,
    /// Time since the trace started.
    #[serde(rename = "at_ms", serialize_with = "millis")]
    pub at: Duration,
}

fn hook_name<S: Serializer>(hook: &Hook, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(hook.name())
}

fn millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

/// Shared, append-only log of hook calls. Clones record into the same log.
#[derive(Clone)]
pub struct Trace {
    inner: Rc<TraceInner>,
}

struct TraceInner {
    start: Instant,
    events: RefCell<Vec<TraceEvent>>,
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trace").field("events", &self.len()).finish()
    }
}

impl Trace {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(TraceInner {
                start: Instant::now(),
                events: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn record(&self, tag: &str, hook: Hook, ok: bool) {
        log::trace!("<{tag}> {hook} ok={ok}");
        self.inner.events.borrow_mut().push(TraceEvent {
            tag: tag.to_string(),
            hook,
            ok,
            at: self.inner.start.elapsed(),
        });
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.inner.events.borrow().clone()
    }

    /// Hooks recorded for `tag`, in call order.
    pub fn hooks_for(&self, tag: &str) -> Vec<Hook> {
        self.inner
            .events
            .borrow()
            .iter()
            .filter(|e| e.tag == tag)
            .map(|e| e.hook)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.events.borrow_mut().clear();
    }

    pub fn wrap<C: Component>(&self, tag: impl Into<String>, component: C) -> Traced<C> {
        Traced {
            inner: component,
            tag: tag.into(),
            trace: self.clone(),
        }
    }

    /// Defines `tag` in `registry` with every instance traced here.
    pub fn define<C, H>(&self, registry: &mut Registry<H>, tag: &str) -> Result<(), RegistryError>
    where
        C: Component + Default,
        H: Host + 'static,
        H::Node: 'static,
    {
        let trace = self.clone();
        let name = tag.to_string();
        registry.define_with(tag, move || trace.wrap(name.clone(), C::default()))
    }
}

/// Wraps a component and records each of its hook calls into a [`Trace`].
pub struct Traced<C> {
    inner: C,
    tag: String,
    trace: Trace,
}

impl<C> Traced<C> {
    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn record(&self, hook: Hook, ok: bool) {
        self.trace.record(&self.tag, hook, ok);
    }
}

impl<C: Component> Component for Traced<C> {
    async fn before_created(&mut self) -> HookResult {
        let result = self.inner.before_created().await;
        self.record(Hook::BeforeCreated, result.is_ok());
        result
    }

    fn created(&mut self) -> HookResult {
        let result = self.inner.created();
        self.record(Hook::Created, result.is_ok());
        result
    }

    fn mounted(&mut self) -> HookResult {
        let result = self.inner.mounted();
        self.record(Hook::Mounted, result.is_ok());
        result
    }

    fn unmounted(&mut self) -> HookResult {
        let result = self.inner.unmounted();
        self.record(Hook::Unmounted, result.is_ok());
        result
    }

    fn render(&self) -> RenderResult {
        let result = self.inner.render();
        self.record(Hook::Render, result.is_ok());
        result
    }

    fn styles(&self) -> &str {
        self.inner.styles()
    }
}
