//! Document engine contract.
//!
//! # Responsibility
//! - Describe the black-box rich-text engine the editor core drives.
//! - Define the geometry and position types exchanged with it.
//!
//! # Invariants
//! - Positions follow the engine's model: text counts one per `char`, every
//!   leaf node counts one, and block boundaries count one each side.
//! - The engine serializes all mutations; the core never edits a copy of the
//!   tree and writes it back except through `set_document`.

use crate::model::document::Node;

/// Half-open position range `[from, to)` inside the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub from: usize,
    pub to: usize,
}

impl TextRange {
    pub fn new(from: usize, to: usize) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

/// Engine selection. `anchor` is where it started, `head` where the caret is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn caret(position: usize) -> Self {
        Self {
            anchor: position,
            head: position,
        }
    }

    pub fn range(from: usize, to: usize) -> Self {
        Self {
            anchor: from,
            head: to,
        }
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }
}

/// Screen rectangle in CSS pixels, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// Text of the caret's containing text block, sliced up to the caret.
///
/// Inline leaf nodes inside the slice must be rendered as one placeholder
/// char (U+FFFC) so that `chars().count()` matches engine positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretContext {
    /// Engine position of the caret.
    pub position: usize,
    pub text_before: String,
}

/// Whether a whole-document replacement becomes an undo step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Record,
    Skip,
}

/// Block-level formatting operations issued through `run_command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockCommand {
    SetParagraph,
    SetHeading(u8),
    ToggleBulletList,
    ToggleOrderedList,
    ToggleTaskList,
    ToggleBlockquote,
    ToggleCodeBlock,
    InsertTable {
        rows: u16,
        cols: u16,
        with_header_row: bool,
    },
    InsertHorizontalRule,
}

impl BlockCommand {
    /// Engine command name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetParagraph => "setParagraph",
            Self::SetHeading(_) => "setHeading",
            Self::ToggleBulletList => "toggleBulletList",
            Self::ToggleOrderedList => "toggleOrderedList",
            Self::ToggleTaskList => "toggleTaskList",
            Self::ToggleBlockquote => "toggleBlockquote",
            Self::ToggleCodeBlock => "toggleCodeBlock",
            Self::InsertTable { .. } => "insertTable",
            Self::InsertHorizontalRule => "setHorizontalRule",
        }
    }
}

/// Rich-text engine driven by the editor core.
///
/// Engines emit `update` and `selectionChange` events; the host forwards
/// them to `EditorSession::on_update` / `on_selection_change` once the
/// current core call has returned.
pub trait DocumentEngine {
    /// Current document tree snapshot.
    fn document(&self) -> Node;

    fn plain_text(&self) -> String {
        self.document().plain_text()
    }

    fn selection(&self) -> Selection;

    /// `None` when the caret is not inside a text block.
    fn caret_context(&self) -> Option<CaretContext>;

    /// Replaces `range` with inline `content`; empty content deletes.
    fn replace_range(&mut self, range: TextRange, content: Vec<Node>);

    fn insert_at_selection(&mut self, content: Vec<Node>);

    fn set_selection(&mut self, selection: Selection);

    /// Returns `false` when the command cannot apply at the caret.
    fn run_command(&mut self, command: &BlockCommand) -> bool;

    /// Replaces the whole document.
    fn set_document(&mut self, document: Node, history: HistoryMode);

    fn rect_for_position(&self, position: usize) -> Option<Rect>;

    /// True while the editing surface holds composition focus.
    fn has_focus(&self) -> bool;
}
