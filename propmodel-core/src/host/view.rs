//! Render output and committed host nodes.
//!
//! A component returns a [`View`]: a description of what to show. Committing
//! a view builds the [`HostNode`] tree the root exposes and attaches every
//! [`NodeRef`] found in it.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// What a component renders.
#[derive(Debug, Clone, Default)]
pub enum View {
    /// Renders nothing.
    #[default]
    Empty,
    /// A text node.
    Text(Cow<'static, str>),
    /// An element with children.
    Element(ElementView),
}

impl View {
    /// Start building an element.
    pub fn element(tag: impl Into<Cow<'static, str>>) -> ElementView {
        ElementView::new(tag)
    }

    pub fn text(content: impl Into<Cow<'static, str>>) -> Self {
        Self::Text(content.into())
    }

    pub fn empty() -> Self {
        Self::Empty
    }
}

impl From<ElementView> for View {
    fn from(element: ElementView) -> Self {
        Self::Element(element)
    }
}

impl From<&'static str> for View {
    fn from(text: &'static str) -> Self {
        Self::text(text)
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

/// An element in a view.
#[derive(Clone)]
pub struct ElementView {
    tag: Cow<'static, str>,
    attrs: Vec<(Cow<'static, str>, Cow<'static, str>)>,
    children: Vec<View>,
    node_ref: Option<NodeRef>,
}

impl ElementView {
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            node_ref: None,
        }
    }

    pub fn attr(
        mut self,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Attach `node_ref` to this element once committed.
    ///
    /// Accepts `None` so a forwarded ref can be passed through as is.
    pub fn node_ref(mut self, node_ref: Option<&NodeRef>) -> Self {
        self.node_ref = node_ref.cloned();
        self
    }

    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    pub fn child_views(&self) -> &[View] {
        &self.children
    }
}

impl fmt::Debug for ElementView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementView")
            .field("tag", &self.tag)
            .field("attrs", &self.attrs)
            .field("children", &self.children)
            .field("has_ref", &self.node_ref.is_some())
            .finish()
    }
}

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// A committed node. Clones refer to the same node.
#[derive(Clone)]
pub struct HostNode {
    inner: Arc<HostNodeData>,
}

struct HostNodeData {
    id: u64,
    kind: HostNodeKind,
}

enum HostNodeKind {
    Text(Cow<'static, str>),
    Element {
        tag: Cow<'static, str>,
        attrs: Vec<(Cow<'static, str>, Cow<'static, str>)>,
        children: Vec<HostNode>,
    },
}

impl HostNode {
    fn new(kind: HostNodeKind) -> Self {
        Self {
            inner: Arc::new(HostNodeData {
                id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
                kind,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Tag name, or `None` for a text node.
    pub fn tag(&self) -> Option<&str> {
        match &self.inner.kind {
            HostNodeKind::Element { tag, .. } => Some(tag.as_ref()),
            HostNodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match &self.inner.kind {
            HostNodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_ref()),
            HostNodeKind::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[HostNode] {
        match &self.inner.kind {
            HostNodeKind::Element { children, .. } => children.as_slice(),
            HostNodeKind::Text(_) => &[],
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.inner.kind {
            HostNodeKind::Text(text) => out.push_str(text),
            HostNodeKind::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            HostNodeKind::Text(text) => f.debug_tuple("Text").field(text).finish(),
            HostNodeKind::Element { tag, children, .. } => f
                .debug_struct("Element")
                .field("id", &self.inner.id)
                .field("tag", tag)
                .field("children", children)
                .finish(),
        }
    }
}

/// A slot that receives the host node of the element it is attached to.
///
/// Empty until the element is committed and again after it is removed.
#[derive(Clone, Default)]
pub struct NodeRef {
    slot: Arc<Mutex<Option<HostNode>>>,
}

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<HostNode> {
        self.slot.lock().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    pub(crate) fn set(&self, node: HostNode) {
        *self.slot.lock() = Some(node);
    }

    pub(crate) fn clear(&self) {
        self.slot.lock().take();
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.get()).finish()
    }
}

/// Build the host tree for `view`, attaching refs and recording them in
/// `attached`.
pub(crate) fn commit(view: &View, attached: &mut Vec<NodeRef>) -> Option<HostNode> {
    match view {
        View::Empty => None,
        View::Text(text) => Some(HostNode::new(HostNodeKind::Text(text.clone()))),
        View::Element(element) => {
            let children = element
                .children
                .iter()
                .filter_map(|child| commit(child, attached))
                .collect();
            let node = HostNode::new(HostNodeKind::Element {
                tag: element.tag.clone(),
                attrs: element.attrs.clone(),
                children,
            });
            if let Some(node_ref) = &element.node_ref {
                node_ref.set(node.clone());
                attached.push(node_ref.clone());
            }
            Some(node)
        }
    }
}
