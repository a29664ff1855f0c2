//! Scan output types and their text presentation.

use std::fmt;

use hoverkit_tree::Node;
use serde::{Deserialize, Serialize};

/// Placeholder shown for an absent or empty attribute.
pub const NOT_AVAILABLE: &str = "N/A";

/// Owned copy of the attributes of one discovered node.
///
/// Holds no reference into the host tree, so results can outlive the snapshot
/// and cross thread boundaries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundNode {
    /// Host widget class.
    pub class_name: String,
    /// Resource identifier, possibly empty.
    pub resource_id: Option<String>,
    /// Visible text, possibly empty.
    pub text: Option<String>,
    /// Accessibility description, possibly empty.
    pub content_description: Option<String>,
}

impl FoundNode {
    /// Copy the attributes out of a tree node.
    pub fn from_node(node: &Node<'_>) -> Self {
        Self {
            class_name: node.class_name().to_string(),
            resource_id: node.resource_id().map(str::to_string),
            text: node.text().map(str::to_string),
            content_description: node.content_description().map(str::to_string),
        }
    }

    /// Resource id for display.
    pub fn display_id(&self) -> &str {
        or_na(self.resource_id.as_deref())
    }

    /// Text for display.
    pub fn display_text(&self) -> &str {
        or_na(self.text.as_deref())
    }

    /// Description for display.
    pub fn display_desc(&self) -> &str {
        or_na(self.content_description.as_deref())
    }
}

impl fmt::Display for FoundNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  ID:    {}", self.display_id())?;
        writeln!(f, "  Class: {}", or_na(Some(&self.class_name)))?;
        writeln!(f, "  Text:  {}", self.display_text())?;
        write!(f, "  Desc:  {}", self.display_desc())
    }
}

/// Treat blank values as absent for presentation.
fn or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

/// A text node together with its depth below the traversal start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntry {
    /// 0 for the start node itself.
    pub depth: usize,
    /// The node carrying the text.
    pub node: FoundNode,
}

/// A list container with the text nodes found beneath it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageList {
    /// The container itself.
    pub container: FoundNode,
    /// Text nodes under the container, pre-order.
    pub texts: Vec<TextEntry>,
}

/// Role-grouped outcome of one scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Package that was scanned.
    pub package_name: String,
    /// Human-readable app name.
    pub name: String,
    /// List container found above the source node, if any.
    pub container: Option<FoundNode>,
    /// Texts under that container, or under the whole window as a fallback.
    pub transcript: Vec<TextEntry>,
    /// Editable nodes.
    pub input_nodes: Vec<FoundNode>,
    /// Clickable nodes.
    pub send_button_nodes: Vec<FoundNode>,
    /// Scrollable or list-class containers with their own texts.
    pub message_lists: Vec<MessageList>,
}

impl ScanResult {
    /// Every message text node across all lists, in list order.
    pub fn message_texts(&self) -> impl Iterator<Item = &FoundNode> {
        self.message_lists
            .iter()
            .flat_map(|l| l.texts.iter().map(|t| &t.node))
    }

    /// Human-readable report; empty sections are omitted.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.package_name)?;
        section(f, "Input fields", self.input_nodes.iter())?;
        section(f, "Send buttons", self.send_button_nodes.iter())?;
        section(
            f,
            "Message lists",
            self.message_lists.iter().map(|l| &l.container),
        )?;
        let texts: Vec<&FoundNode> = self.message_texts().collect();
        section(f, "Message texts", texts.into_iter())?;
        if !self.transcript.is_empty() {
            writeln!(f, "\nTranscript ({})", self.transcript.len())?;
            for entry in &self.transcript {
                writeln!(
                    f,
                    "{}'{}' (ID: {})",
                    "  ".repeat(entry.depth),
                    entry.node.display_text(),
                    entry.node.display_id()
                )?;
            }
        }
        Ok(())
    }
}

/// Write one titled block of node cards when `nodes` is non-empty.
fn section<'a>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    nodes: impl ExactSizeIterator<Item = &'a FoundNode>,
) -> fmt::Result {
    if nodes.len() == 0 {
        return Ok(());
    }
    writeln!(f, "\n{} ({})", title, nodes.len())?;
    for node in nodes {
        writeln!(f, "{node}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(class: &str, id: Option<&str>, text: Option<&str>) -> FoundNode {
        FoundNode {
            class_name: class.into(),
            resource_id: id.map(Into::into),
            text: text.map(Into::into),
            content_description: Some(String::new()),
        }
    }

    #[test]
    fn blank_values_render_as_na_but_stay_in_data() {
        let n = found("android.widget.Button", Some(""), Some("   "));
        assert_eq!(n.display_id(), NOT_AVAILABLE);
        assert_eq!(n.display_text(), NOT_AVAILABLE);
        assert_eq!(n.display_desc(), NOT_AVAILABLE);
        assert_eq!(n.resource_id.as_deref(), Some(""));
    }

    #[test]
    fn render_skips_empty_sections() {
        let result = ScanResult {
            package_name: "com.example.chat".into(),
            name: "Chat".into(),
            container: None,
            transcript: Vec::new(),
            input_nodes: vec![found("EditText", Some("input"), None)],
            send_button_nodes: Vec::new(),
            message_lists: vec![MessageList {
                container: found("RecyclerView", None, None),
                texts: vec![TextEntry {
                    depth: 2,
                    node: found("TextView", Some("msg"), Some("hello")),
                }],
            }],
        };
        let text = result.render();
        assert!(text.starts_with("Chat (com.example.chat)\n"));
        assert!(text.contains("Input fields (1)"));
        assert!(!text.contains("Send buttons"));
        assert!(text.contains("Message lists (1)"));
        assert!(text.contains("Message texts (1)"));
        assert!(text.contains("Text:  hello"));
        assert_eq!(result.message_texts().count(), 1);
    }
}
