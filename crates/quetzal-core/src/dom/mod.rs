//! In-memory document used as the reference [`Host`].
//!
//! Nodes live in a slot-map arena behind a shared handle, so a `Document` can
//! be cloned into every instance that renders into it. Boundaries are
//! separate roots hanging off their host element; they are not children of it
//! and do not show up in [`Document::outer_html`].
//!
//! ```rust
//! use quetzal_core::dom::Document;
//!
//! let doc = Document::new();
//! let frag = doc.parse("<p>hello <b>world</b></p>");
//! doc.append_child(doc.body(), frag).unwrap();
//! assert_eq!(doc.inner_html(doc.body()), "<p>hello <b>world</b></p>");
//! ```

mod parse;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use slotmap::SlotMap;

use crate::host::{BoundaryMode, Host, HostError};
use parse::Token;

slotmap::new_key_type! {
    pub struct NodeId;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
    Fragment,
    Boundary {
        mode: BoundaryMode,
    },
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Element -> its boundary root; boundary root -> its host element.
    shadow: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            shadow: None,
        }
    }
}

struct Tree {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
    body: NodeId,
}

#[derive(Clone)]
pub struct Document {
    tree: Rc<RefCell<Tree>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.tree.borrow();
        f.debug_struct("Document")
            .field("nodes", &tree.nodes.len())
            .finish()
    }
}

impl Document {
    /// A document holding an empty `<body>`.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new(NodeKind::Document));
        let body = nodes.insert(NodeData::new(NodeKind::Element {
            tag: "body".into(),
            attrs: Vec::new(),
        }));
        nodes[body].parent = Some(root);
        nodes[root].children.push(body);
        Self {
            tree: Rc::new(RefCell::new(Tree { nodes, root, body })),
        }
    }

    pub fn root(&self) -> NodeId {
        self.tree.borrow().root
    }

    pub fn body(&self) -> NodeId {
        self.tree.borrow().body
    }

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    pub fn create_fragment(&self) -> NodeId {
        self.alloc(NodeKind::Fragment)
    }

    /// Parses `markup` into a new detached fragment.
    pub fn parse(&self, markup: &str) -> NodeId {
        let fragment = self.create_fragment();
        let mut tree = self.tree.borrow_mut();
        let mut stack = vec![fragment];

        for token in parse::tokenize(markup) {
            let top = *stack.last().unwrap_or(&fragment);
            match token {
                Token::Start {
                    name,
                    attrs,
                    self_closing,
                } => {
                    let opens = !self_closing && !parse::is_void(&name);
                    let node = tree.insert_child(top, NodeKind::Element { tag: name, attrs });
                    if opens {
                        stack.push(node);
                    }
                }
                Token::End(name) => {
                    let open = stack
                        .iter()
                        .rposition(|&id| tree.tag(id) == Some(name.as_str()));
                    // Stray end tags are dropped; the fragment itself never closes.
                    if let Some(pos) = open.filter(|&pos| pos > 0) {
                        stack.truncate(pos);
                    }
                }
                Token::Text(text) => {
                    tree.insert_child(top, NodeKind::Text(text));
                }
                Token::Comment(text) => {
                    tree.insert_child(top, NodeKind::Comment(text));
                }
            }
        }
        fragment
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.tree.borrow().nodes.contains_key(node)
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.tree.borrow().nodes.get(node).map(|n| n.kind.clone())
    }

    pub fn tag_name(&self, node: NodeId) -> Option<String> {
        self.tree.borrow().tag(node).map(str::to_string)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        let tree = self.tree.borrow();
        match &tree.nodes.get(node)?.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<(), HostError> {
        let mut tree = self.tree.borrow_mut();
        match &mut tree.get_mut(node)?.kind {
            NodeKind::Element { attrs, .. } => {
                let name = name.to_ascii_lowercase();
                match attrs.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, v)) => *v = value.to_string(),
                    None => attrs.push((name, value.to_string())),
                }
                Ok(())
            }
            _ => Err(HostError::Platform("attributes are only set on elements".into())),
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.borrow().nodes.get(node)?.parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.tree
            .borrow()
            .nodes
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// The boundary root attached to `element`, if any.
    pub fn boundary_of(&self, element: NodeId) -> Option<NodeId> {
        let tree = self.tree.borrow();
        let data = tree.nodes.get(element)?;
        match data.kind {
            NodeKind::Element { .. } => data.shadow,
            _ => None,
        }
    }

    /// The element a boundary root is attached to.
    pub fn boundary_host(&self, boundary: NodeId) -> Option<NodeId> {
        let tree = self.tree.borrow();
        let data = tree.nodes.get(boundary)?;
        match data.kind {
            NodeKind::Boundary { .. } => data.shadow,
            _ => None,
        }
    }

    /// Whether `node` is reachable from the document root, crossing
    /// boundaries through their host element.
    pub fn is_connected(&self, node: NodeId) -> bool {
        let tree = self.tree.borrow();
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == tree.root {
                return true;
            }
            let Some(data) = tree.nodes.get(id) else {
                return false;
            };
            cursor = match data.kind {
                NodeKind::Boundary { .. } => data.shadow,
                _ => data.parent,
            };
        }
        false
    }

    /// `node` and everything below it in tree order. Does not enter boundaries.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let tree = self.tree.borrow();
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(data) = tree.nodes.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(data.children.iter().rev());
        }
        out
    }

    /// Appends `child` under `parent`, detaching it from its old parent first.
    /// A fragment hands over its children and stays empty.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        let mut tree = self.tree.borrow_mut();
        tree.get(parent)?;
        let (is_fragment, movable) = {
            let kind = &tree.get(child)?.kind;
            (
                matches!(kind, NodeKind::Fragment),
                !matches!(kind, NodeKind::Document | NodeKind::Boundary { .. }),
            )
        };
        if !movable {
            return Err(HostError::Platform("node cannot be re-parented".into()));
        }
        let moved = if is_fragment {
            std::mem::take(&mut tree.get_mut(child)?.children)
        } else {
            vec![child]
        };

        for &node in &moved {
            if tree.is_inclusive_ancestor(node, parent) {
                return Err(HostError::Platform(
                    "cannot append a node into its own subtree".into(),
                ));
            }
        }
        for node in moved {
            tree.detach(node);
            tree.nodes[node].parent = Some(parent);
            tree.nodes[parent].children.push(node);
        }
        Ok(())
    }

    /// Detaches `node` from its parent. The node stays alive.
    pub fn remove(&self, node: NodeId) -> Result<(), HostError> {
        let mut tree = self.tree.borrow_mut();
        tree.get(node)?;
        tree.detach(node);
        Ok(())
    }

    pub fn attach_boundary(&self, element: NodeId, mode: BoundaryMode) -> Result<NodeId, HostError> {
        let mut tree = self.tree.borrow_mut();
        let data = tree.get(element)?;
        if !matches!(data.kind, NodeKind::Element { .. }) {
            return Err(HostError::Platform("only elements can own a boundary".into()));
        }
        if data.shadow.is_some() {
            return Err(HostError::BoundaryExists);
        }
        let boundary = tree.nodes.insert(NodeData {
            shadow: Some(element),
            ..NodeData::new(NodeKind::Boundary { mode })
        });
        tree.nodes[element].shadow = Some(boundary);
        Ok(boundary)
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        if let Some(data) = tree.nodes.get(node) {
            for &child in &data.children {
                tree.write_node(child, &mut out);
            }
        }
        out
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let tree = self.tree.borrow();
        let mut out = String::new();
        tree.write_node(node, &mut out);
        out
    }

    /// Serialized content of the boundary on `element`.
    pub fn boundary_html(&self, element: NodeId) -> Option<String> {
        self.boundary_of(element).map(|b| self.inner_html(b))
    }

    fn alloc(&self, kind: NodeKind) -> NodeId {
        self.tree.borrow_mut().nodes.insert(NodeData::new(kind))
    }
}

impl Tree {
    fn get(&self, node: NodeId) -> Result<&NodeData, HostError> {
        self.nodes.get(node).ok_or(HostError::UnknownNode)
    }

    fn get_mut(&mut self, node: NodeId) -> Result<&mut NodeData, HostError> {
        self.nodes.get_mut(node).ok_or(HostError::UnknownNode)
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    fn insert_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let node = self.nodes.insert(NodeData {
            parent: Some(parent),
            ..NodeData::new(kind)
        });
        self.nodes[parent].children.push(node);
        node
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|&c| c != node);
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        let mut stack = vec![Frame::Enter(node)];
        while let Some(frame) = stack.pop() {
            let id = match frame {
                Frame::Enter(id) => id,
                Frame::Close(tag) => {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                    continue;
                }
            };
            let Some(data) = self.nodes.get(id) else {
                continue;
            };
            match &data.kind {
                NodeKind::Element { tag, attrs } => {
                    out.push('<');
                    out.push_str(tag);
                    for (name, value) in attrs {
                        out.push(' ');
                        out.push_str(name);
                        if !value.is_empty() {
                            out.push_str("=\"");
                            out.push_str(&value.replace('"', "&quot;"));
                            out.push('"');
                        }
                    }
                    out.push('>');
                    if parse::is_void(tag) {
                        continue;
                    }
                    stack.push(Frame::Close(tag));
                    stack.extend(data.children.iter().rev().map(|&c| Frame::Enter(c)));
                }
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                NodeKind::Document | NodeKind::Fragment | NodeKind::Boundary { .. } => {
                    stack.extend(data.children.iter().rev().map(|&c| Frame::Enter(c)));
                }
            }
        }
    }
}

enum Frame<'a> {
    Enter(NodeId),
    Close(&'a str),
}

impl Host for Document {
    type Node = NodeId;

    fn attach_boundary(&self, element: &NodeId, mode: BoundaryMode) -> Result<NodeId, HostError> {
        Document::attach_boundary(self, *element, mode)
    }

    fn parse_fragment(&self, markup: &str) -> Result<NodeId, HostError> {
        Ok(self.parse(markup))
    }

    fn create_style(&self, css: &str) -> Result<NodeId, HostError> {
        let style = self.create_element("style");
        if !css.is_empty() {
            let text = self.create_text(css);
            Document::append_child(self, style, text)?;
        }
        Ok(style)
    }

    fn first_child(&self, node: &NodeId) -> Option<NodeId> {
        self.tree.borrow().nodes.get(*node)?.children.first().copied()
    }

    fn is_element(&self, node: &NodeId) -> bool {
        matches!(self.kind(*node), Some(NodeKind::Element { .. }))
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        Document::append_child(self, *parent, *child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize() {
        let doc = Document::new();
        let frag = doc.parse(r#"<div class="card"><h1>Title</h1><br><p>body</p></div>"#);
        assert_eq!(
            doc.inner_html(frag),
            r#"<div class="card"><h1>Title</h1><br><p>body</p></div>"#
        );
    }

    #[test]
    fn test_parse_closes_open_elements() {
        let doc = Document::new();
        let frag = doc.parse("<section><p>dangling");
        assert_eq!(doc.inner_html(frag), "<section><p>dangling</p></section>");
    }

    #[test]
    fn test_serialize_deep_nesting() {
        let depth = 100_000;
        let doc = Document::new();
        let frag = doc.parse(&"<div>".repeat(depth));
        let html = doc.inner_html(frag);
        assert_eq!(html.len(), depth * "<div></div>".len());
        assert!(html.starts_with("<div><div>"));
        assert!(html.ends_with("</div></div>"));
    }

    #[test]
    fn test_non_ascii_round_trip() {
        let doc = Document::new();
        let frag = doc.parse("<p title=\"café\">été</p>");
        assert_eq!(doc.inner_html(frag), "<p title=\"café\">été</p>");
    }

    #[test]
    fn test_stray_end_tag_ignored() {
        let doc = Document::new();
        let frag = doc.parse("<b>x</i></b>y");
        assert_eq!(doc.inner_html(frag), "<b>x</b>y");
    }

    #[test]
    fn test_fragment_append_moves_children() {
        let doc = Document::new();
        let frag = doc.parse("<i>a</i><i>b</i>");
        doc.append_child(doc.body(), frag).unwrap();
        assert!(doc.children(frag).is_empty());
        assert_eq!(doc.children(doc.body()).len(), 2);
        assert_eq!(doc.inner_html(doc.body()), "<i>a</i><i>b</i>");
    }

    #[test]
    fn test_append_rejects_cycles() {
        let doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(outer, inner).unwrap();
        assert!(doc.append_child(inner, outer).is_err());
        assert!(doc.append_child(outer, outer).is_err());
    }

    #[test]
    fn test_connectedness() {
        let doc = Document::new();
        let host = doc.create_element("x-card");
        assert!(!doc.is_connected(host));

        doc.append_child(doc.body(), host).unwrap();
        assert!(doc.is_connected(host));

        let boundary = doc.attach_boundary(host, BoundaryMode::Open).unwrap();
        let inside = doc.create_element("p");
        doc.append_child(boundary, inside).unwrap();
        assert!(doc.is_connected(inside));
        assert_eq!(doc.boundary_host(boundary), Some(host));

        doc.remove(host).unwrap();
        assert!(!doc.is_connected(host));
        assert!(!doc.is_connected(inside));
    }

    #[test]
    fn test_boundary_attached_once() {
        let doc = Document::new();
        let host = doc.create_element("x-card");
        doc.attach_boundary(host, BoundaryMode::Open).unwrap();
        assert_eq!(
            doc.attach_boundary(host, BoundaryMode::Closed),
            Err(HostError::BoundaryExists)
        );
    }

    #[test]
    fn test_boundary_hidden_from_light_tree() {
        let doc = Document::new();
        let host = doc.create_element("x-card");
        doc.append_child(doc.body(), host).unwrap();
        let boundary = doc.attach_boundary(host, BoundaryMode::Open).unwrap();
        let frag = doc.parse("<p>inside</p>");
        doc.append_child(boundary, frag).unwrap();

        assert_eq!(doc.outer_html(host), "<x-card></x-card>");
        assert_eq!(doc.boundary_html(host).as_deref(), Some("<p>inside</p>"));
    }

    #[test]
    fn test_set_attribute() {
        let doc = Document::new();
        let el = doc.create_element("input");
        doc.set_attribute(el, "Type", "text").unwrap();
        doc.set_attribute(el, "value", "say \"hi\"").unwrap();
        assert_eq!(doc.attribute(el, "type").as_deref(), Some("text"));
        assert_eq!(
            doc.outer_html(el),
            r#"<input type="text" value="say &quot;hi&quot;">"#
        );
    }

    #[test]
    fn test_style_node() {
        let doc = Document::new();
        let style = Host::create_style(&doc, "p{color:red}").unwrap();
        assert_eq!(doc.outer_html(style), "<style>p{color:red}</style>");
        let empty = Host::create_style(&doc, "").unwrap();
        assert_eq!(doc.outer_html(empty), "<style></style>");
    }
}
