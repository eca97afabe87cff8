//! Document tree model.
//!
//! # Responsibility
//! - Mirror the persisted document JSON schema (`type`/`attrs`/`content`/
//!   `text`/`marks`) with typed node and mark kinds.
//! - Provide read-only projections the editor core needs: plain text,
//!   position sizes and structural emptiness.
//!
//! # Invariants
//! - A snapshot root is always a `doc` node; anything else is malformed.
//! - Leaf nodes (images, rules, hard breaks, reference chips) occupy exactly
//!   one position; text occupies one position per `char`.
//! - Serialization is canonical: attrs are key-sorted and empty fields are
//!   omitted, so two equal trees always produce the same snapshot string.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Node and mark attributes, kept open so unknown attributes round-trip.
pub type Attrs = serde_json::Map<String, Value>;

/// Node kinds accepted by the document schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Doc,
    Paragraph,
    /// `attrs.level` in `1..=6`.
    Heading,
    Text,
    HardBreak,
    BulletList,
    OrderedList,
    ListItem,
    TaskList,
    /// `attrs.checked`.
    TaskItem,
    Blockquote,
    /// `attrs.language`.
    CodeBlock,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    HorizontalRule,
    /// `attrs.src`, `attrs.relativePath`, `attrs.width`, `attrs.rotation`.
    Image,
    /// Quoted excerpt from a literature source.
    ReferenceBlock,
    /// Cross-reference chip: `attrs.title`, `attrs.href`, `attrs.exists`.
    #[serde(alias = "crossReference")]
    WikiLink,
}

impl NodeKind {
    /// Nodes without children that occupy a single position.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            Self::HardBreak
                | Self::HorizontalRule
                | Self::Image
                | Self::ReferenceBlock
                | Self::WikiLink
        )
    }

    pub fn is_inline(self) -> bool {
        matches!(self, Self::Text | Self::HardBreak | Self::WikiLink)
    }

    /// Blocks whose direct children are inline content.
    pub fn is_textblock(self) -> bool {
        matches!(self, Self::Paragraph | Self::Heading | Self::CodeBlock)
    }
}

/// Inline formatting mark kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkKind {
    Bold,
    Italic,
    Strike,
    Code,
    Highlight,
    /// `attrs.href`.
    Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: MarkKind,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(kind: MarkKind) -> Self {
        Self {
            kind,
            attrs: Attrs::new(),
        }
    }
}

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
    /// Only set on `text` nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

/// Typed view of a cross-reference chip's attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceChip {
    pub title: String,
    /// Target card id once resolved; equals `title` while unresolved.
    pub href: String,
    /// Whether resolution succeeded when the chip was written.
    pub exists: bool,
}

impl ReferenceChip {
    pub fn unresolved(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            href: title.clone(),
            title,
            exists: false,
        }
    }

    pub fn resolved(title: impl Into<String>, card_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: card_id.into(),
            exists: true,
        }
    }

    /// True when `href` still carries the title instead of a card id.
    pub fn is_unresolved(&self) -> bool {
        self.href == self.title
    }

    pub fn into_node(self) -> Node {
        Node::new(NodeKind::WikiLink)
            .with_attr("title", self.title)
            .with_attr("href", self.href)
            .with_attr("exists", self.exists)
    }
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            attrs: Attrs::new(),
            content: Vec::new(),
            text: None,
            marks: Vec::new(),
        }
    }

    pub fn with_content(kind: NodeKind, content: Vec<Node>) -> Self {
        Self {
            content,
            ..Self::new(kind)
        }
    }

    pub fn doc(content: Vec<Node>) -> Self {
        Self::with_content(NodeKind::Doc, content)
    }

    /// The canonical empty document: one empty paragraph.
    pub fn empty_doc() -> Self {
        Self::doc(vec![Self::paragraph(Vec::new())])
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Self::with_content(NodeKind::Paragraph, content)
    }

    pub fn heading(level: u8, content: Vec<Node>) -> Self {
        Self::with_content(NodeKind::Heading, content).with_attr("level", level)
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            text: Some(value.into()),
            ..Self::new(NodeKind::Text)
        }
    }

    pub fn image(src: impl Into<String>, relative_path: Option<&str>) -> Self {
        let node = Self::new(NodeKind::Image).with_attr("src", src.into());
        match relative_path {
            Some(path) => node.with_attr("relativePath", path),
            None => node,
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_marks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = marks;
        self
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<Value>) {
        self.attrs.insert(key.to_string(), value.into());
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        self.attrs.get(key).and_then(Value::as_bool)
    }

    pub fn heading_level(&self) -> Option<u8> {
        if self.kind != NodeKind::Heading {
            return None;
        }
        self.attrs
            .get("level")
            .and_then(Value::as_u64)
            .and_then(|level| u8::try_from(level).ok())
    }

    /// Returns the chip attributes when this node is a cross-reference.
    pub fn as_reference(&self) -> Option<ReferenceChip> {
        if self.kind != NodeKind::WikiLink {
            return None;
        }
        let title = self.attr_str("title")?.to_string();
        let href = self
            .attr_str("href")
            .filter(|href| !href.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| title.clone());
        Some(ReferenceChip {
            title,
            href,
            exists: self.attr_bool("exists").unwrap_or(false),
        })
    }

    /// Number of positions this node occupies inside its parent.
    pub fn node_size(&self) -> usize {
        match self.kind {
            NodeKind::Text => self.text.as_deref().map_or(0, |text| text.chars().count()),
            kind if kind.is_leaf() => 1,
            _ => self.content_size() + 2,
        }
    }

    /// Number of positions between this node's opening and closing token.
    ///
    /// For the `doc` root this is the document length used to clamp carets.
    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::node_size).sum()
    }

    /// True for a document with no visible content: no children, or only
    /// paragraphs without any non-empty inline content.
    pub fn is_structurally_empty(&self) -> bool {
        self.content.iter().all(|child| {
            child.kind == NodeKind::Paragraph
                && child.content.iter().all(|inline| {
                    inline.kind == NodeKind::Text
                        && inline.text.as_deref().map_or(true, str::is_empty)
                })
        })
    }

    /// Text projection: blocks separated by newlines, chips as `[[title]]`.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain_text(&mut out);
        out
    }

    fn write_plain_text(&self, out: &mut String) {
        match self.kind {
            NodeKind::Text => out.push_str(self.text.as_deref().unwrap_or_default()),
            NodeKind::HardBreak => out.push('\n'),
            NodeKind::WikiLink => {
                if let Some(title) = self.attr_str("title") {
                    out.push_str("[[");
                    out.push_str(title);
                    out.push_str("]]");
                }
            }
            NodeKind::Image | NodeKind::HorizontalRule | NodeKind::ReferenceBlock => {}
            _ => {
                for (index, child) in self.content.iter().enumerate() {
                    if index > 0 && !child.kind.is_inline() {
                        out.push('\n');
                    }
                    child.write_plain_text(out);
                }
            }
        }
    }

    /// Visits this node and all descendants in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in &self.content {
            child.walk(visit);
        }
    }

    /// Mutable pre-order traversal.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Node)) {
        visit(self);
        for child in &mut self.content {
            child.walk_mut(visit);
        }
    }

    /// Serializes the tree into its canonical snapshot string.
    pub fn to_snapshot(&self) -> String {
        match serde_json::to_string(self) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("event=snapshot_serialize module=document status=error error={err}");
                String::new()
            }
        }
    }

    /// Parses a persisted snapshot. The root must be a `doc` node.
    pub fn parse_snapshot(raw: &str) -> Result<Self, SnapshotError> {
        let node: Node = serde_json::from_str(raw).map_err(SnapshotError::Json)?;
        if node.kind != NodeKind::Doc {
            return Err(SnapshotError::NotADocument(node.kind));
        }
        Ok(node)
    }

    /// Parses a snapshot, replacing malformed input with an empty document.
    pub fn from_snapshot_or_empty(raw: &str) -> Self {
        match Self::parse_snapshot(raw) {
            Ok(node) => node,
            Err(err) => {
                warn!(
                    "event=snapshot_parse module=document status=fallback input_len={} error={}",
                    raw.len(),
                    err
                );
                Self::empty_doc()
            }
        }
    }
}

/// Snapshot decoding failures.
#[derive(Debug)]
pub enum SnapshotError {
    Json(serde_json::Error),
    NotADocument(NodeKind),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "snapshot is not a valid document tree: {err}"),
            Self::NotADocument(kind) => write!(f, "snapshot root must be `doc`, got {kind:?}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::NotADocument(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Mark, MarkKind, Node, NodeKind, ReferenceChip, SnapshotError};

    fn sample_doc() -> Node {
        Node::doc(vec![
            Node::heading(1, vec![Node::text("Title")]),
            Node::paragraph(vec![
                Node::text("see "),
                ReferenceChip::resolved("Other", "card-2").into_node(),
                Node::text(" now").with_marks(vec![Mark::new(MarkKind::Bold)]),
            ]),
        ])
    }

    #[test]
    fn parses_editor_json_with_aliases_and_marks() {
        let raw = r#"{"type":"doc","content":[{"type":"paragraph","content":[
            {"type":"text","text":"hi","marks":[{"type":"link","attrs":{"href":"https://x"}}]},
            {"type":"crossReference","attrs":{"title":"A","href":"A","exists":false}}
        ]}]}"#;
        let doc = Node::parse_snapshot(raw).expect("valid snapshot");
        let paragraph = &doc.content[0];
        assert_eq!(paragraph.content[0].marks[0].kind, MarkKind::Link);
        assert_eq!(paragraph.content[1].kind, NodeKind::WikiLink);
        assert!(paragraph.content[1]
            .as_reference()
            .expect("chip")
            .is_unresolved());
    }

    #[test]
    fn snapshot_roundtrip_is_canonical() {
        let doc = sample_doc();
        let snapshot = doc.to_snapshot();
        let reparsed = Node::parse_snapshot(&snapshot).expect("own snapshot parses");
        assert_eq!(reparsed, doc);
        assert_eq!(reparsed.to_snapshot(), snapshot);
    }

    #[test]
    fn malformed_snapshot_falls_back_to_empty_doc() {
        assert!(matches!(
            Node::parse_snapshot(r#"{"type":"paragraph"}"#),
            Err(SnapshotError::NotADocument(NodeKind::Paragraph))
        ));
        assert!(matches!(
            Node::parse_snapshot("not json"),
            Err(SnapshotError::Json(_))
        ));
        assert_eq!(Node::from_snapshot_or_empty("{"), Node::empty_doc());
    }

    #[test]
    fn sizes_follow_position_model() {
        let doc = sample_doc();
        // heading: 5 chars + 2, paragraph: 4 + chip + 4 + 2
        assert_eq!(doc.content_size(), 7 + 11);
    }

    #[test]
    fn plain_text_renders_chips_as_brackets() {
        assert_eq!(sample_doc().plain_text(), "Title\nsee [[Other]] now");
    }

    #[test]
    fn structural_emptiness_ignores_empty_paragraphs_only() {
        assert!(Node::empty_doc().is_structurally_empty());
        assert!(Node::doc(vec![]).is_structurally_empty());
        assert!(Node::doc(vec![Node::paragraph(vec![Node::text("")])]).is_structurally_empty());
        assert!(!Node::doc(vec![Node::heading(1, vec![])]).is_structurally_empty());
        assert!(!sample_doc().is_structurally_empty());
    }
}
