//! Browser host (wasm32) backed by real shadow roots.
//!
//! Rust owns the lifecycle; a few lines of JS glue forward the custom element
//! callbacks:
//!
//! ```text
//! import init, { start, upgrade, WebOptions } from "./pkg/app.js";
//!
//! await init();
//! start(new WebOptions());
//!
//! customElements.define("x-greeting", class extends HTMLElement {
//!   constructor() {
//!     super();
//!     this.handle = upgrade("x-greeting", this);
//!     this.handle.activate().catch(console.error);
//!   }
//!   connectedCallback() { this.handle.connected(); }
//!   disconnectedCallback() { this.handle.disconnected(); }
//! });
//! ```
//!
//! Components are registered from Rust with [`define`] before `start` runs.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{HtmlTemplateElement, Node, ShadowRootInit, ShadowRootMode};

use quetzal_core::{AnyInstance, BoundaryMode, Component, Host, HostError, Registry, RegistryError};

use crate::describe;

thread_local! {
    static REGISTRY: RefCell<Registry<WebHost>> = RefCell::new(Registry::new());
}

/// The page's `document`, seen as a [`Host`].
#[derive(Clone, Debug)]
pub struct WebHost {
    document: web_sys::Document,
}

impl WebHost {
    pub fn new() -> Result<Self, HostError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(HostError::Unavailable)?;
        Ok(Self { document })
    }

    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }
}

fn js_err(e: JsValue) -> HostError {
    HostError::Platform(format!("{e:?}"))
}

impl Host for WebHost {
    type Node = Node;

    fn attach_boundary(&self, element: &Node, mode: BoundaryMode) -> Result<Node, HostError> {
        let element = element
            .dyn_ref::<web_sys::Element>()
            .ok_or_else(|| HostError::Platform("only elements can own a shadow root".into()))?;
        if element.shadow_root().is_some() {
            return Err(HostError::BoundaryExists);
        }
        let mode = match mode {
            BoundaryMode::Open => ShadowRootMode::Open,
            BoundaryMode::Closed => ShadowRootMode::Closed,
        };
        let root = element
            .attach_shadow(&ShadowRootInit::new(mode))
            .map_err(js_err)?;
        Ok(root.into())
    }

    fn parse_fragment(&self, markup: &str) -> Result<Node, HostError> {
        let template: HtmlTemplateElement = self
            .document
            .create_element("template")
            .map_err(js_err)?
            .dyn_into()
            .map_err(|_| HostError::Platform("<template> is not supported".into()))?;
        template.set_inner_html(markup);
        self.document
            .import_node_with_deep(&template.content(), true)
            .map_err(js_err)
    }

    fn create_style(&self, css: &str) -> Result<Node, HostError> {
        let style = self.document.create_element("style").map_err(js_err)?;
        if !css.is_empty() {
            style.set_text_content(Some(css));
        }
        Ok(style.into())
    }

    fn first_child(&self, node: &Node) -> Option<Node> {
        node.first_child()
    }

    fn is_element(&self, node: &Node) -> bool {
        node.node_type() == Node::ELEMENT_NODE
    }

    fn append_child(&self, parent: &Node, child: &Node) -> Result<(), HostError> {
        parent.append_child(child).map(drop).map_err(js_err)
    }
}

#[wasm_bindgen]
#[derive(Clone, Debug, Default)]
pub struct WebOptions {
    closed_boundaries: bool,
    log_level: Option<String>,
}

#[wasm_bindgen]
impl WebOptions {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    #[wasm_bindgen(getter)]
    pub fn closed_boundaries(&self) -> bool {
        self.closed_boundaries
    }

    #[wasm_bindgen(setter)]
    pub fn set_closed_boundaries(&mut self, v: bool) {
        self.closed_boundaries = v;
    }

    #[wasm_bindgen(getter)]
    pub fn log_level(&self) -> Option<String> {
        self.log_level.clone()
    }

    #[wasm_bindgen(setter)]
    pub fn set_log_level(&mut self, v: Option<String>) {
        self.log_level = v;
    }
}

impl WebOptions {
    fn boundary_mode(&self) -> BoundaryMode {
        if self.closed_boundaries {
            BoundaryMode::Closed
        } else {
            BoundaryMode::Open
        }
    }
}

/// Installs the panic hook and console logger and applies `options` to the
/// registry. Definitions made earlier keep the mode they were made with.
#[wasm_bindgen]
pub fn start(options: WebOptions) {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    let level = options
        .log_level
        .as_deref()
        .and_then(|l| l.parse().ok())
        .unwrap_or(log::Level::Info);
    let _ = console_log::init_with_level(level);

    let mode = options.boundary_mode();
    REGISTRY.with(|r| {
        let mut registry = r.borrow_mut();
        let previous = std::mem::take(&mut *registry);
        *registry = previous.with_mode(mode);
    });
    log::info!("quetzal started ({mode} boundaries)");
}

/// Registers `C` under `tag`. Call once per tag.
pub fn define<C: Component + Default>(tag: &str) -> Result<(), RegistryError> {
    REGISTRY.with(|r| r.borrow_mut().define::<C>(tag))
}

pub fn define_with<C, F>(tag: &str, ctor: F) -> Result<(), RegistryError>
where
    C: Component,
    F: Fn() -> C + 'static,
{
    REGISTRY.with(|r| r.borrow_mut().define_with(tag, ctor))
}

#[wasm_bindgen]
pub fn is_defined(tag: &str) -> bool {
    REGISTRY.with(|r| r.borrow().is_defined(tag))
}

/// JS-side handle to one upgraded element.
#[wasm_bindgen]
pub struct ElementHandle {
    instance: Rc<dyn AnyInstance<WebHost>>,
}

#[wasm_bindgen]
impl ElementHandle {
    #[wasm_bindgen(getter)]
    pub fn tag(&self) -> String {
        self.instance.tag().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.instance.state().to_string()
    }

    /// Resolves once `created` has run; rejects with the failing step.
    pub fn activate(&self) -> js_sys::Promise {
        let activation = self.instance.activate();
        future_to_promise(async move {
            activation
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(|e| js_sys::Error::new(&describe(&e)).into())
        })
    }

    pub fn connected(&self) -> Result<(), JsValue> {
        self.instance.connected().map_err(to_js)
    }

    pub fn disconnected(&self) -> Result<(), JsValue> {
        self.instance.disconnected().map_err(to_js)
    }
}

/// Binds the component defined for `tag` to `element`. Nothing runs until
/// [`ElementHandle::activate`].
#[wasm_bindgen]
pub fn upgrade(tag: &str, element: web_sys::HtmlElement) -> Result<ElementHandle, JsValue> {
    let host = WebHost::new().map_err(|e| JsValue::from_str(&e.to_string()))?;
    let instance = REGISTRY
        .with(|r| r.borrow().create(tag, host, element.into()))
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(ElementHandle {
        instance: Rc::from(instance),
    })
}

fn to_js(e: quetzal_core::Error) -> JsValue {
    let message = describe(&e);
    log::error!("{message}");
    js_sys::Error::new(&message).into()
}
