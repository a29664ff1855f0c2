//! Immutable snapshots of a host UI element tree.
//!
//! A [`NodeTree`] is an arena owned by whoever captured it (normally the host,
//! for the duration of one event). Nodes refer to each other by [`NodeId`]
//! index, never by pointer, so parent and child navigation is a lookup into
//! the arena. Consumers borrow a tree and walk it through the copyable
//! [`Node`] view.
//!
//! The host reports a `child_count` for every node. Some of those children may
//! be unavailable at capture time (the host hands back nothing for that
//! index); [`Node::child`] returns `None` for them. Walks bounded by the
//! reported count therefore always terminate.

use serde::{Deserialize, Serialize};

/// Index of a node within a [`NodeTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in its arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Screen rectangle in host pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

impl Rect {
    /// Construct a rectangle from its edges.
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width, clamped at zero.
    #[must_use]
    pub const fn width(&self) -> i32 {
        if self.right > self.left {
            self.right - self.left
        } else {
            0
        }
    }
}

/// Scalar attributes of one element, used when building a tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attrs {
    /// Host widget class, e.g. `android.widget.EditText`.
    pub class_name: String,
    /// Host resource identifier.
    pub resource_id: Option<String>,
    /// Visible text.
    pub text: Option<String>,
    /// Accessibility description.
    pub content_description: Option<String>,
    /// Whether the element accepts clicks.
    pub clickable: bool,
    /// Whether the element scrolls.
    pub scrollable: bool,
    /// Whether the element accepts text input.
    pub editable: bool,
    /// On-screen bounds, when the host reported them.
    pub bounds: Option<Rect>,
    /// Host-reported child count; `None` means "the children actually added".
    pub reported_children: Option<usize>,
}

impl Attrs {
    /// Attributes for an element of the given class.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Set the resource identifier.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    /// Set the visible text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the accessibility description.
    #[must_use]
    pub fn desc(mut self, desc: impl Into<String>) -> Self {
        self.content_description = Some(desc.into());
        self
    }

    /// Mark the element clickable.
    #[must_use]
    pub fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    /// Mark the element scrollable.
    #[must_use]
    pub fn scrollable(mut self) -> Self {
        self.scrollable = true;
        self
    }

    /// Mark the element editable.
    #[must_use]
    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    /// Set the on-screen bounds.
    #[must_use]
    pub fn bounds(mut self, rect: Rect) -> Self {
        self.bounds = Some(rect);
        self
    }

    /// Override the host-reported child count.
    #[must_use]
    pub fn reported_children(mut self, count: usize) -> Self {
        self.reported_children = Some(count);
        self
    }
}

/// Nested, serializable description of a subtree.
///
/// This is the form used by scenario files and fixtures; [`NodeTree::from_spec`]
/// flattens it into an arena.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    /// Host widget class.
    pub class_name: String,
    /// Host resource identifier.
    pub resource_id: Option<String>,
    /// Visible text.
    pub text: Option<String>,
    /// Accessibility description.
    pub content_description: Option<String>,
    /// Whether the element accepts clicks.
    pub clickable: bool,
    /// Whether the element scrolls.
    pub scrollable: bool,
    /// Whether the element accepts text input.
    pub editable: bool,
    /// On-screen bounds.
    pub bounds: Option<Rect>,
    /// Host-reported child count, if it differs from `children.len()`.
    pub child_count: Option<usize>,
    /// Child elements in host order.
    pub children: Vec<Self>,
}

impl NodeSpec {
    /// Scalar attributes of this element.
    fn attrs(&self) -> Attrs {
        Attrs {
            class_name: self.class_name.clone(),
            resource_id: self.resource_id.clone(),
            text: self.text.clone(),
            content_description: self.content_description.clone(),
            clickable: self.clickable,
            scrollable: self.scrollable,
            editable: self.editable,
            bounds: self.bounds,
            reported_children: self.child_count,
        }
    }
}

/// Arena slot for one element.
#[derive(Clone, Debug)]
struct NodeData {
    /// Scalar attributes.
    attrs: Attrs,
    /// Parent slot, `None` for the root.
    parent: Option<NodeId>,
    /// Children that were available at capture time, in host order.
    children: Vec<NodeId>,
}

/// Snapshot of one window's element tree.
#[derive(Clone, Debug, Default)]
pub struct NodeTree {
    /// Package owning the window, when known.
    package: Option<String>,
    /// Arena; slot 0 is the root.
    nodes: Vec<NodeData>,
}

impl NodeTree {
    /// Start building a tree for `package`.
    pub fn builder(package: Option<&str>) -> TreeBuilder {
        TreeBuilder {
            tree: Self {
                package: package.map(str::to_string),
                nodes: Vec::new(),
            },
        }
    }

    /// Flatten a nested spec into a tree rooted at `root`.
    pub fn from_spec(package: Option<&str>, root: &NodeSpec) -> Self {
        let mut b = Self::builder(package);
        let root_id = b.root(root.attrs());
        let mut stack: Vec<(NodeId, &NodeSpec)> = vec![(root_id, root)];
        while let Some((parent, spec)) = stack.pop() {
            for child in &spec.children {
                let id = b.child(parent, child.attrs());
                stack.push((id, child));
            }
        }
        b.build()
    }

    /// Package owning this window.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Number of captured nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The window's root element.
    pub fn root(&self) -> Option<Node<'_>> {
        (!self.nodes.is_empty()).then_some(Node {
            tree: self,
            id: NodeId(0),
        })
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        (id.index() < self.nodes.len()).then_some(Node { tree: self, id })
    }

    /// Follow child indices from the root, e.g. `[0, 2]` is the third child of
    /// the root's first child.
    pub fn resolve_path(&self, path: &[usize]) -> Option<NodeId> {
        let mut cur = self.root()?;
        for &i in path {
            cur = cur.child(i)?;
        }
        Some(cur.id())
    }

    /// First node, in pre-order, whose resource id equals `id`.
    pub fn find_by_resource_id(&self, id: &str) -> Option<Node<'_>> {
        let root = self.root()?;
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.resource_id() == Some(id) {
                return Some(node);
            }
            let n = node.child_count();
            for i in (0..n).rev() {
                if let Some(c) = node.child(i) {
                    stack.push(c);
                }
            }
        }
        None
    }

    /// Arena slot for `id`; ids handed out by this tree are always in range.
    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// Incremental construction of a [`NodeTree`].
#[derive(Debug)]
pub struct TreeBuilder {
    /// Tree under construction.
    tree: NodeTree,
}

impl TreeBuilder {
    /// Add the root element. Replaces any previously added nodes.
    pub fn root(&mut self, attrs: Attrs) -> NodeId {
        self.tree.nodes.clear();
        self.tree.nodes.push(NodeData {
            attrs,
            parent: None,
            children: Vec::new(),
        });
        NodeId(0)
    }

    /// Append a child under `parent`.
    ///
    /// # Panics
    /// If `parent` was not produced by this builder.
    pub fn child(&mut self, parent: NodeId, attrs: Attrs) -> NodeId {
        let id = NodeId(self.tree.nodes.len() as u32);
        self.tree.nodes.push(NodeData {
            attrs,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.tree.nodes[parent.index()].children.push(id);
        id
    }

    /// Finish the tree.
    pub fn build(self) -> NodeTree {
        self.tree
    }
}

/// Borrowed view of one node.
#[derive(Clone, Copy, Debug)]
pub struct Node<'a> {
    /// Owning arena.
    tree: &'a NodeTree,
    /// Slot in the arena.
    id: NodeId,
}

impl<'a> Node<'a> {
    /// Arena id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Tree this node belongs to.
    pub fn tree(&self) -> &'a NodeTree {
        self.tree
    }

    /// Scalar attributes.
    pub fn attrs(&self) -> &'a Attrs {
        &self.tree.data(self.id).attrs
    }

    /// Host widget class.
    pub fn class_name(&self) -> &'a str {
        &self.attrs().class_name
    }

    /// Resource identifier.
    pub fn resource_id(&self) -> Option<&'a str> {
        self.attrs().resource_id.as_deref()
    }

    /// Visible text.
    pub fn text(&self) -> Option<&'a str> {
        self.attrs().text.as_deref()
    }

    /// Accessibility description.
    pub fn content_description(&self) -> Option<&'a str> {
        self.attrs().content_description.as_deref()
    }

    /// Whether the element accepts clicks.
    pub fn is_clickable(&self) -> bool {
        self.attrs().clickable
    }

    /// Whether the element scrolls.
    pub fn is_scrollable(&self) -> bool {
        self.attrs().scrollable
    }

    /// Whether the element accepts text input.
    pub fn is_editable(&self) -> bool {
        self.attrs().editable
    }

    /// On-screen bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.attrs().bounds
    }

    /// Host-reported child count.
    pub fn child_count(&self) -> usize {
        let data = self.tree.data(self.id);
        data.attrs.reported_children.unwrap_or(data.children.len())
    }

    /// Child at `index`, or `None` when out of range or unavailable.
    pub fn child(&self, index: usize) -> Option<Self> {
        if index >= self.child_count() {
            return None;
        }
        self.tree
            .data(self.id)
            .children
            .get(index)
            .map(|&id| Self {
                tree: self.tree,
                id,
            })
    }

    /// Parent element, `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        self.tree.data(self.id).parent.map(|id| Self {
            tree: self.tree,
            id,
        })
    }
}
