//! Tag -> constructor table owned by a host environment.
//!
//! The lifecycle pipeline never looks here. Hosts use it to turn "an element
//! named `x-card` was created" into an [`Instance`] they can activate.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::component::Component;
use crate::element::Element;
use crate::error::RegistryError;
use crate::host::{BoundaryMode, Host};
use crate::instance::{AnyInstance, Instance};

type Constructor<H> = Rc<dyn Fn(H, <H as Host>::Node) -> Box<dyn AnyInstance<H>>>;

pub struct Registry<H: Host> {
    definitions: BTreeMap<String, Constructor<H>>,
    mode: BoundaryMode,
}

impl<H: Host> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> fmt::Debug for Registry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.definitions.keys().collect::<Vec<_>>())
            .field("mode", &self.mode)
            .finish()
    }
}

impl<H: Host> Registry<H> {
    pub fn new() -> Self {
        Self {
            definitions: BTreeMap::new(),
            mode: BoundaryMode::default(),
        }
    }

    /// Boundary mode given to every instance this registry creates.
    pub fn with_mode(mut self, mode: BoundaryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> BoundaryMode {
        self.mode
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.contains_key(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}

impl<H> Registry<H>
where
    H: Host + 'static,
    H::Node: 'static,
{
    pub fn define<C: Component + Default>(&mut self, tag: &str) -> Result<(), RegistryError> {
        self.define_with(tag, C::default)
    }

    /// Same as [`define`](Self::define) but creates display-only elements.
    pub fn define_static<C: Component + Default>(
        &mut self,
        tag: &str,
    ) -> Result<(), RegistryError> {
        self.insert(tag, move |tag, mode, host, node| {
            let element: Element<H::Node, crate::element::Static> = Element::new(node);
            Box::new(
                Instance::with_element(C::default(), host, element)
                    .with_tag(tag)
                    .with_mode(mode),
            )
        })
    }

    pub fn define_with<C, F>(&mut self, tag: &str, ctor: F) -> Result<(), RegistryError>
    where
        C: Component,
        F: Fn() -> C + 'static,
    {
        self.insert(tag, move |tag, mode, host, node| {
            Box::new(
                Instance::new(ctor(), host, node)
                    .with_tag(tag)
                    .with_mode(mode),
            )
        })
    }

    /// Instantiates the component defined for `tag`. Nothing runs yet; the
    /// caller drives activation.
    pub fn create(
        &self,
        tag: &str,
        host: H,
        node: H::Node,
    ) -> Result<Box<dyn AnyInstance<H>>, RegistryError> {
        let ctor = self
            .definitions
            .get(tag)
            .ok_or_else(|| RegistryError::Undefined(tag.to_string()))?;
        Ok(ctor(host, node))
    }

    fn insert(
        &mut self,
        tag: &str,
        build: impl Fn(Rc<str>, BoundaryMode, H, H::Node) -> Box<dyn AnyInstance<H>> + 'static,
    ) -> Result<(), RegistryError> {
        if !is_valid_tag(tag) {
            return Err(RegistryError::InvalidTag(tag.to_string()));
        }
        if self.is_defined(tag) {
            return Err(RegistryError::AlreadyDefined(tag.to_string()));
        }
        let name: Rc<str> = tag.into();
        let mode = self.mode;
        self.definitions.insert(
            tag.to_string(),
            Rc::new(move |host, node| build(name.clone(), mode, host, node)),
        );
        log::debug!("defined <{tag}>");
        Ok(())
    }
}

/// Custom element naming rule: starts with a lowercase ASCII letter,
/// contains a hyphen, and uses only `[a-z0-9._-]`.
pub fn is_valid_tag(tag: &str) -> bool {
    tag.starts_with(|c: char| c.is_ascii_lowercase())
        && tag.contains('-')
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Blank, RenderResult};
    use crate::dom::Document;
    use crate::lifecycle::LifecycleState;

    #[derive(Default)]
    struct Hello;

    impl Component for Hello {
        fn render(&self) -> RenderResult {
            Ok("<p>hello</p>".into())
        }
    }

    #[test]
    fn test_tag_rules() {
        assert!(is_valid_tag("x-card"));
        assert!(is_valid_tag("my-el.v2_b"));
        assert!(!is_valid_tag("card"));
        assert!(!is_valid_tag("X-card"));
        assert!(!is_valid_tag("-card"));
        assert!(!is_valid_tag("x-Card"));
        assert!(!is_valid_tag(""));
    }

    #[test]
    fn test_define_once() {
        let mut reg: Registry<Document> = Registry::new();
        reg.define::<Hello>("x-hello").unwrap();
        assert_eq!(
            reg.define::<Blank>("x-hello"),
            Err(RegistryError::AlreadyDefined("x-hello".into()))
        );
        assert_eq!(
            reg.define::<Hello>("hello"),
            Err(RegistryError::InvalidTag("hello".into()))
        );
        assert_eq!(reg.tags().collect::<Vec<_>>(), vec!["x-hello"]);
    }

    #[test]
    fn test_create_and_activate() {
        let mut reg: Registry<Document> = Registry::new().with_mode(BoundaryMode::Closed);
        reg.define::<Hello>("x-hello").unwrap();

        let doc = Document::new();
        let node = doc.create_element("x-hello");
        let instance = reg.create("x-hello", doc.clone(), node).unwrap();
        assert_eq!(&*instance.tag(), "x-hello");
        assert_eq!(instance.state(), LifecycleState::Unattached);

        pollster::block_on(instance.activate()).unwrap();
        assert_eq!(instance.state(), LifecycleState::Created);
        assert_eq!(
            doc.boundary_html(node).as_deref(),
            Some("<p>hello<style></style></p>")
        );
        let boundary = instance.boundary().unwrap();
        assert!(matches!(
            doc.kind(boundary),
            Some(crate::dom::NodeKind::Boundary {
                mode: BoundaryMode::Closed
            })
        ));
    }

    #[test]
    fn test_create_undefined() {
        let reg: Registry<Document> = Registry::new();
        let doc = Document::new();
        let node = doc.create_element("x-missing");
        assert_eq!(
            reg.create("x-missing", doc, node).err(),
            Some(RegistryError::Undefined("x-missing".into()))
        );
    }
}
