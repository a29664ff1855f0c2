//! The host environment as seen by the engine.

use std::sync::Arc;

use hoverkit_overlay::WindowLayer;
use hoverkit_tree::{Node, NodeId, NodeTree};
use serde::{Deserialize, Serialize};

/// Kind of UI change the host reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A window appeared or changed state.
    #[default]
    WindowStateChanged,
    /// Content inside a window changed.
    WindowContentChanged,
    /// A view was clicked.
    ViewClicked,
    /// A view gained focus.
    ViewFocused,
    /// Text in an editable view changed.
    TextChanged,
    /// A view scrolled.
    ViewScrolled,
}

/// The node an event originated from, within its snapshot.
#[derive(Clone, Debug)]
pub struct SourceNode {
    /// Snapshot that owns the node.
    pub tree: Arc<NodeTree>,
    /// The node itself.
    pub node: NodeId,
}

impl SourceNode {
    /// Borrow the node view.
    pub fn node(&self) -> Option<Node<'_>> {
        self.tree.node(self.node)
    }
}

/// One UI-change notification.
#[derive(Clone, Debug, Default)]
pub struct HostEvent {
    /// What changed.
    pub kind: EventKind,
    /// Package that fired the event, when the host knows it.
    pub package: Option<String>,
    /// Node the event came from.
    pub source: Option<SourceNode>,
}

impl HostEvent {
    /// Event of `kind` from `package` with no source node.
    pub fn new(kind: EventKind, package: impl Into<String>) -> Self {
        Self {
            kind,
            package: Some(package.into()),
            source: None,
        }
    }

    /// Attach a source node.
    pub fn with_source(mut self, tree: Arc<NodeTree>, node: NodeId) -> Self {
        self.source = Some(SourceNode { tree, node });
        self
    }
}

/// Queries and services the host provides at call time.
pub trait Host: Send + Sync {
    /// Package owning the topmost window, if known.
    fn foreground_package(&self) -> Option<String>;
    /// Snapshot of the active window's UI tree.
    fn active_window(&self) -> Option<Arc<NodeTree>>;
    /// Layer overlays are registered with.
    fn window_layer(&self) -> Arc<dyn WindowLayer>;
    /// Usable screen size `(width, height)` in pixels.
    fn screen_size(&self) -> (i32, i32);
}
