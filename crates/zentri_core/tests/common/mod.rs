#![allow(dead_code)]

use std::time::{Duration, Instant};
use zentri_core::config::EditorConfig;
use zentri_core::model::document::{Mark, Node, NodeKind};
use zentri_core::{
    AssetStore, BlockCommand, CardPatch, CardRecord, CardStore, CardSummary, CardType,
    CaretContext, DocumentEngine, EditorSession, HistoryMode, Rect, Selection, StoreError,
    StoreResult, TextRange,
};

pub const SELF_ID: &str = "card-self";

pub type TestSession = EditorSession<FakeEngine, RecordingCardStore, RecordingAssetStore>;

pub fn at(start: Instant, millis: u64) -> Instant {
    start + Duration::from_millis(millis)
}

/// In-memory engine over a flat list of top-level blocks.
///
/// Carets may only sit inside top-level text blocks, which covers every
/// editing scenario the session drives.
#[derive(Debug)]
pub struct FakeEngine {
    doc: Node,
    selection: Selection,
    pub focused: bool,
    pub set_document_calls: Vec<HistoryMode>,
    pub commands: Vec<BlockCommand>,
}

#[derive(Debug, Clone, PartialEq)]
enum Inline {
    Char(char, Vec<Mark>),
    Leaf(Node),
}

impl FakeEngine {
    pub fn new(doc: Node) -> Self {
        let mut engine = Self {
            doc,
            selection: Selection::caret(1),
            focused: false,
            set_document_calls: Vec::new(),
            commands: Vec::new(),
        };
        engine.move_to_end();
        engine
    }

    pub fn with_paragraphs(texts: &[&str]) -> Self {
        let blocks = texts
            .iter()
            .map(|text| {
                if text.is_empty() {
                    Node::paragraph(Vec::new())
                } else {
                    Node::paragraph(vec![Node::text(*text)])
                }
            })
            .collect();
        Self::new(Node::doc(blocks))
    }

    pub fn focused(mut self) -> Self {
        self.focused = true;
        self
    }

    /// Caret at the end of the last text block.
    pub fn move_to_end(&mut self) {
        let mut offset = 0;
        let mut end = None;
        for block in &self.doc.content {
            if block.kind.is_textblock() {
                end = Some(offset + 1 + block.content_size());
            }
            offset += block.node_size();
        }
        self.selection = Selection::caret(end.unwrap_or(0));
    }

    /// Types `text` at the selection, as a keyboard would.
    pub fn type_text(&mut self, text: &str) {
        let range = TextRange::new(self.selection.from(), self.selection.to());
        self.replace_range(range, vec![Node::text(text)]);
    }

    /// Deletes the inline content right before a collapsed caret.
    pub fn backspace(&mut self) {
        let head = self.selection.head;
        self.replace_range(TextRange::new(head - 1, head), Vec::new());
    }

    pub fn block(&self, index: usize) -> &Node {
        &self.doc.content[index]
    }

    pub fn block_text(&self, index: usize) -> String {
        self.doc.content[index].plain_text()
    }

    fn locate(&self, position: usize) -> Option<(usize, usize)> {
        let mut offset = 0;
        for (index, block) in self.doc.content.iter().enumerate() {
            if block.kind.is_textblock() {
                let start = offset + 1;
                let end = start + block.content_size();
                if (start..=end).contains(&position) {
                    return Some((index, position - start));
                }
            }
            offset += block.node_size();
        }
        None
    }

    fn flatten(content: &[Node]) -> Vec<Inline> {
        let mut inlines = Vec::new();
        for node in content {
            match (node.kind, node.text.as_deref()) {
                (NodeKind::Text, Some(text)) => {
                    inlines.extend(text.chars().map(|c| Inline::Char(c, node.marks.clone())))
                }
                (NodeKind::Text, None) => {}
                _ => inlines.push(Inline::Leaf(node.clone())),
            }
        }
        inlines
    }

    fn rebuild(inlines: Vec<Inline>) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut run = String::new();
        let mut run_marks: Vec<Mark> = Vec::new();
        for inline in inlines {
            match inline {
                Inline::Char(c, marks) => {
                    if !run.is_empty() && marks != run_marks {
                        let text = std::mem::take(&mut run);
                        nodes.push(Node::text(text).with_marks(run_marks.clone()));
                    }
                    run_marks = marks;
                    run.push(c);
                }
                Inline::Leaf(node) => {
                    if !run.is_empty() {
                        let text = std::mem::take(&mut run);
                        nodes.push(Node::text(text).with_marks(run_marks.clone()));
                    }
                    nodes.push(node);
                }
            }
        }
        if !run.is_empty() {
            nodes.push(Node::text(run).with_marks(run_marks));
        }
        nodes
    }

    fn clamp(&self, position: usize) -> usize {
        position.min(self.doc.content_size())
    }
}

impl DocumentEngine for FakeEngine {
    fn document(&self) -> Node {
        self.doc.clone()
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn caret_context(&self) -> Option<CaretContext> {
        if !self.selection.is_empty() {
            return None;
        }
        let (index, offset) = self.locate(self.selection.head)?;
        let text_before = Self::flatten(&self.doc.content[index].content)
            .into_iter()
            .take(offset)
            .map(|inline| match inline {
                Inline::Char(c, _) => c,
                Inline::Leaf(_) => '\u{FFFC}',
            })
            .collect();
        Some(CaretContext {
            position: self.selection.head,
            text_before,
        })
    }

    fn replace_range(&mut self, range: TextRange, content: Vec<Node>) {
        let (Some((index, from)), Some((to_index, to))) =
            (self.locate(range.from), self.locate(range.to))
        else {
            panic!("range {range:?} is not inside a text block");
        };
        assert_eq!(index, to_index, "range must stay inside one block");

        let inserted = Self::flatten(&content);
        let inserted_len = inserted.len();
        let block = &mut self.doc.content[index];
        let mut inlines = Self::flatten(&block.content);
        inlines.splice(from..to, inserted);
        block.content = Self::rebuild(inlines);
        self.selection = Selection::caret(range.from + inserted_len);
    }

    fn insert_at_selection(&mut self, content: Vec<Node>) {
        if content.iter().all(|node| node.kind.is_inline()) {
            let range = TextRange::new(self.selection.from(), self.selection.to());
            self.replace_range(range, content);
            return;
        }
        let index = self
            .locate(self.selection.head)
            .map_or(self.doc.content.len(), |(index, _)| index + 1);
        for (offset, node) in content.into_iter().enumerate() {
            self.doc.content.insert(index + offset, node);
        }
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection =
            Selection::range(self.clamp(selection.anchor), self.clamp(selection.head));
    }

    fn run_command(&mut self, command: &BlockCommand) -> bool {
        let Some((index, _)) = self.locate(self.selection.head) else {
            return false;
        };
        self.commands.push(*command);
        if *command == BlockCommand::InsertHorizontalRule {
            self.doc
                .content
                .insert(index + 1, Node::new(NodeKind::HorizontalRule));
            return true;
        }
        let block = &mut self.doc.content[index];
        match command {
            BlockCommand::SetHeading(level) => {
                block.kind = NodeKind::Heading;
                block.set_attr("level", *level);
            }
            BlockCommand::SetParagraph => {
                block.kind = NodeKind::Paragraph;
                block.attrs.clear();
            }
            BlockCommand::ToggleCodeBlock => block.kind = NodeKind::CodeBlock,
            _ => {}
        }
        true
    }

    fn set_document(&mut self, document: Node, history: HistoryMode) {
        self.doc = document;
        self.set_document_calls.push(history);
        let selection = self.selection;
        self.set_selection(selection);
    }

    fn rect_for_position(&self, position: usize) -> Option<Rect> {
        let left = 40.0 + position as f64 * 7.0;
        Some(Rect::new(left, 200.0, left + 7.0, 218.0))
    }

    fn has_focus(&self) -> bool {
        self.focused
    }
}

/// Card store that records every call.
#[derive(Debug, Default)]
pub struct RecordingCardStore {
    pub records: Vec<CardRecord>,
    pub updates: Vec<(String, CardPatch)>,
    pub failed_updates: usize,
    pub creates: Vec<(CardType, String)>,
    pub fail_updates: bool,
    pub fail_create: bool,
    pub reject_create: bool,
}

impl RecordingCardStore {
    /// Store holding the edited card plus `others` as `(id, title)`.
    pub fn with_cards(others: &[(&str, &str)]) -> Self {
        let mut store = Self::default();
        store.records.push(record(SELF_ID, "Inbox"));
        store
            .records
            .extend(others.iter().map(|(id, title)| record(id, title)));
        store
    }

    pub fn content_writes(&self) -> Vec<String> {
        self.updates
            .iter()
            .filter_map(|(_, patch)| patch.content.clone())
            .collect()
    }

    pub fn title_writes(&self) -> Vec<String> {
        self.updates
            .iter()
            .filter_map(|(_, patch)| patch.title.clone())
            .collect()
    }

    pub fn link_writes(&self) -> Vec<Vec<String>> {
        self.updates
            .iter()
            .filter_map(|(_, patch)| patch.links.clone())
            .collect()
    }
}

pub fn record(id: &str, title: &str) -> CardRecord {
    CardRecord {
        id: id.to_string(),
        title: title.to_string(),
        kind: CardType::Permanent,
        content: Node::empty_doc().to_snapshot(),
        plain_text: String::new(),
        preview: None,
        links: Vec::new(),
        created_at: 0,
        updated_at: 0,
    }
}

impl CardStore for RecordingCardStore {
    fn create_card(&mut self, kind: CardType, title: &str) -> StoreResult<Option<CardSummary>> {
        self.creates.push((kind, title.to_string()));
        if self.fail_create {
            return Err(StoreError::Rejected("backend offline".to_string()));
        }
        if self.reject_create {
            return Ok(None);
        }
        let id = format!("card-new-{}", self.creates.len());
        let mut created = record(&id, title);
        created.kind = kind;
        self.records.push(created);
        Ok(Some(CardSummary::new(id, title)))
    }

    fn update_card(&mut self, id: &str, patch: &CardPatch) -> StoreResult<()> {
        if self.fail_updates {
            self.failed_updates += 1;
            return Err(StoreError::Rejected("write failed".to_string()));
        }
        self.updates.push((id.to_string(), patch.clone()));
        if let Some(card) = self.records.iter_mut().find(|card| card.id == id) {
            if let Some(title) = &patch.title {
                card.title = title.clone();
            }
            if let Some(content) = &patch.content {
                card.content = content.clone();
            }
            if let Some(links) = &patch.links {
                card.links = links.clone();
            }
        }
        Ok(())
    }

    fn card_by_id(&self, id: &str) -> StoreResult<Option<CardRecord>> {
        Ok(self.records.iter().find(|card| card.id == id).cloned())
    }

    fn cards(&self) -> StoreResult<Vec<CardSummary>> {
        Ok(self.records.iter().map(CardRecord::summary).collect())
    }
}

/// Asset store that records saves and deletes.
#[derive(Debug, Default)]
pub struct RecordingAssetStore {
    pub saved: Vec<String>,
    pub deleted: Vec<String>,
    pub fail_save: bool,
}

impl AssetStore for RecordingAssetStore {
    fn save_image(&mut self, bytes: &[u8], _filename: &str) -> StoreResult<String> {
        if self.fail_save || bytes.is_empty() {
            return Err(StoreError::Rejected("save failed".to_string()));
        }
        let path = format!("attachments/images/img-{}.png", self.saved.len() + 1);
        self.saved.push(path.clone());
        Ok(path)
    }

    fn image_url(&self, relative_path: &str) -> String {
        format!("asset://localhost/vault/{relative_path}")
    }

    fn delete_image(&mut self, relative_path: &str) -> StoreResult<()> {
        self.deleted.push(relative_path.to_string());
        Ok(())
    }
}

pub fn open_session(engine: FakeEngine, store: RecordingCardStore) -> TestSession {
    open_session_with(engine, store, EditorConfig::default())
}

pub fn open_session_with(
    engine: FakeEngine,
    store: RecordingCardStore,
    config: EditorConfig,
) -> TestSession {
    EditorSession::new(
        SELF_ID,
        engine,
        store,
        RecordingAssetStore::default(),
        config,
    )
}
