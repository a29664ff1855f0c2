//! Ancestor and descendant walks over a [`NodeTree`].

use hoverkit_tree::{Node, NodeTree};
use tracing::debug;

use crate::{
    patterns::ListPatterns,
    result::{FoundNode, MessageList, ScanResult, TextEntry},
};

/// Maximum number of nodes examined on the way up from the source node.
pub const MAX_ANCESTOR_STEPS: usize = 30;

/// Who a scan is performed for.
#[derive(Clone, Copy, Debug)]
pub struct ScanTarget<'a> {
    /// Package identifier.
    pub package_name: &'a str,
    /// Human-readable app name.
    pub name: &'a str,
}

/// Stateless scanner configured with list-container patterns.
#[derive(Clone, Debug, Default)]
pub struct Scanner {
    /// Class names treated as list containers.
    patterns: ListPatterns,
}

impl Scanner {
    /// Scanner using `patterns` to recognise list containers.
    pub fn new(patterns: ListPatterns) -> Self {
        Self { patterns }
    }

    /// Walk up from `source` looking for a list container.
    ///
    /// Examines at most [`MAX_ANCESTOR_STEPS`] nodes, starting with `source`
    /// itself, and stops early at the root.
    pub fn find_list_container<'a>(&self, source: Node<'a>) -> Option<Node<'a>> {
        let mut current = Some(source);
        for _ in 0..MAX_ANCESTOR_STEPS {
            let node = current?;
            if self.patterns.matches(node.class_name()) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    /// Scan for candidates.
    ///
    /// `source` is the node an event originated from (any snapshot) and
    /// `window` is the active window. Texts are collected under the list
    /// container above `source`, or under the whole window when there is
    /// none. Role buckets are always filled from the whole window, falling
    /// back to the source's own tree when no window is available.
    pub fn scan(
        &self,
        source: Option<Node<'_>>,
        window: Option<&NodeTree>,
        target: ScanTarget<'_>,
    ) -> ScanResult {
        let container = source.and_then(|s| self.find_list_container(s));
        let transcript = match container {
            Some(c) => collect_texts(c),
            None => {
                debug!("no list container above source; scanning whole window");
                window
                    .and_then(NodeTree::root)
                    .map(collect_texts)
                    .unwrap_or_default()
            }
        };

        let classify_root = window
            .and_then(NodeTree::root)
            .or_else(|| source.and_then(|s| s.tree().root()));
        let mut result = ScanResult {
            package_name: target.package_name.to_string(),
            name: target.name.to_string(),
            container: container.as_ref().map(FoundNode::from_node),
            transcript,
            input_nodes: Vec::new(),
            send_button_nodes: Vec::new(),
            message_lists: Vec::new(),
        };
        if let Some(root) = classify_root {
            self.classify(root, &mut result);
        }
        debug!(
            package = %result.package_name,
            inputs = result.input_nodes.len(),
            buttons = result.send_button_nodes.len(),
            lists = result.message_lists.len(),
            texts = result.transcript.len(),
            "scan_complete"
        );
        result
    }

    /// Sort every node under `root` into role buckets.
    fn classify(&self, root: Node<'_>, result: &mut ScanResult) {
        preorder(root, |node, _| {
            if node.is_editable() {
                result.input_nodes.push(FoundNode::from_node(&node));
            }
            if node.is_clickable() {
                result.send_button_nodes.push(FoundNode::from_node(&node));
            }
            if node.is_scrollable() || self.patterns.matches(node.class_name()) {
                result.message_lists.push(MessageList {
                    container: FoundNode::from_node(&node),
                    texts: collect_texts(node),
                });
            }
        });
    }
}

/// Every node under `start` (inclusive) with non-empty text, pre-order.
pub fn collect_texts(start: Node<'_>) -> Vec<TextEntry> {
    let mut out = Vec::new();
    preorder(start, |node, depth| {
        if node.text().is_some_and(|t| !t.is_empty()) {
            out.push(TextEntry {
                depth,
                node: FoundNode::from_node(&node),
            });
        }
    });
    out
}

/// Pre-order visit bounded by each node's reported child count.
///
/// Uses an explicit stack so deep host trees cannot exhaust the call stack.
fn preorder<'a>(start: Node<'a>, mut visit: impl FnMut(Node<'a>, usize)) {
    let mut stack = vec![(start, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        visit(node, depth);
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push((child, depth + 1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use hoverkit_tree::{Attrs, NodeId};

    use super::*;

    const TARGET: ScanTarget<'static> = ScanTarget {
        package_name: "com.example.chat",
        name: "Chat",
    };

    /// Window with a message list, an input and a send button.
    fn chat_window() -> (NodeTree, NodeId) {
        let mut b = NodeTree::builder(Some("com.example.chat"));
        let root = b.root(Attrs::new("android.widget.FrameLayout"));
        let list = b.child(
            root,
            Attrs::new("androidx.recyclerview.widget.RecyclerView").scrollable(),
        );
        let row = b.child(list, Attrs::new("android.widget.LinearLayout"));
        let msg = b.child(row, Attrs::new("android.widget.TextView").id("msg").text("hello"));
        b.child(row, Attrs::new("android.widget.TextView").id("msg").text(""));
        b.child(list, Attrs::new("android.widget.TextView").id("msg").text("world"));
        b.child(root, Attrs::new("android.widget.EditText").id("input").editable());
        b.child(
            root,
            Attrs::new("android.widget.Button").id("send").text("Send").clickable(),
        );
        (b.build(), msg)
    }

    #[test]
    fn container_found_above_source() {
        let (tree, msg) = chat_window();
        let scanner = Scanner::default();
        let source = tree.node(msg);
        let result = scanner.scan(source, Some(&tree), TARGET);

        let container = result.container.as_ref().expect("container");
        assert!(container.class_name.ends_with("RecyclerView"));
        let texts: Vec<(&str, usize)> = result
            .transcript
            .iter()
            .map(|t| (t.node.text.as_deref().unwrap_or(""), t.depth))
            .collect();
        assert_eq!(texts, vec![("hello", 2), ("world", 1)]);
    }

    #[test]
    fn roles_are_bucketed_across_window() {
        let (tree, msg) = chat_window();
        let result = Scanner::default().scan(tree.node(msg), Some(&tree), TARGET);
        assert_eq!(result.input_nodes.len(), 1);
        assert_eq!(result.input_nodes[0].resource_id.as_deref(), Some("input"));
        assert_eq!(result.send_button_nodes.len(), 1);
        assert_eq!(result.message_lists.len(), 1);
        assert_eq!(result.message_lists[0].texts.len(), 2);
        assert_eq!(result.message_texts().count(), 2);
    }

    #[test]
    fn falls_back_to_whole_window_without_container() {
        let (tree, _) = chat_window();
        let scanner = Scanner::new(ListPatterns::new(&["NoSuchList"]).expect("compile"));
        let send = tree.find_by_resource_id("send").map(|n| n.id());
        let result = scanner.scan(send.and_then(|id| tree.node(id)), Some(&tree), TARGET);
        assert!(result.container.is_none());
        // Whole window pre-order: hello, world, Send.
        let texts: Vec<&str> = result
            .transcript
            .iter()
            .filter_map(|t| t.node.text.as_deref())
            .collect();
        assert_eq!(texts, vec!["hello", "world", "Send"]);
    }

    #[test]
    fn ancestor_walk_is_bounded() {
        // A chain of 40 plain nodes with a list at the very top.
        let mut b = NodeTree::builder(None);
        let mut cur = b.root(Attrs::new("android.widget.ListView"));
        for _ in 0..40 {
            cur = b.child(cur, Attrs::new("android.view.View"));
        }
        let leaf = b.child(cur, Attrs::new("android.widget.TextView").text("deep"));
        let tree = b.build();
        let scanner = Scanner::default();
        let source = tree.node(leaf).expect("leaf");
        assert!(scanner.find_list_container(source).is_none());

        let result = scanner.scan(Some(source), Some(&tree), TARGET);
        assert!(result.container.is_none());
        assert_eq!(result.transcript.len(), 1);
        assert_eq!(result.transcript[0].depth, 41);
    }

    #[test]
    fn container_within_limit_is_found() {
        let mut b = NodeTree::builder(None);
        let mut cur = b.root(Attrs::new("android.widget.ListView"));
        for _ in 0..28 {
            cur = b.child(cur, Attrs::new("android.view.View"));
        }
        let tree = b.build();
        let source = tree.node(cur).expect("leaf");
        let found = Scanner::default().find_list_container(source);
        assert_eq!(found.map(|n| n.class_name()), Some("android.widget.ListView"));
    }

    #[test]
    fn no_window_uses_source_tree() {
        let (tree, msg) = chat_window();
        let result = Scanner::default().scan(tree.node(msg), None, TARGET);
        assert_eq!(result.input_nodes.len(), 1);
        assert_eq!(result.transcript.len(), 2);
    }

    #[test]
    fn result_serializes_without_tree_references() {
        let (tree, msg) = chat_window();
        let result = Scanner::default().scan(tree.node(msg), Some(&tree), TARGET);
        let json = serde_json::to_string(&result).expect("serialize");
        let back: ScanResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, result);
    }
}
