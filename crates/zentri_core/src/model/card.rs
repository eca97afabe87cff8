//! Card reference model.
//!
//! # Responsibility
//! - Define the card shapes the editor core exchanges with the card store.
//! - Keep partial-update semantics explicit (`CardPatch`).
//!
//! # Invariants
//! - `CardId` is stable for the card lifetime and never reused.
//! - A `CardPatch` only touches the fields that are `Some`.

use serde::{Deserialize, Serialize};

/// Stable card identifier.
///
/// Kept as a string alias: ids are generated UUIDs for regular cards but
/// may be caller-provided for imported or dated cards.
pub type CardId = String;

/// Card category used when creating new cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    /// Quick capture, the default for cards created from a reference menu.
    #[default]
    Fleeting,
    /// Notes taken against a literature source.
    Literature,
    /// Curated long-lived notes.
    Permanent,
    /// Cards that track a project.
    Project,
    /// Cards whose body is a canvas board.
    Canvas,
}

impl CardType {
    /// Stored name, as written to the `type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fleeting => "fleeting",
            Self::Literature => "literature",
            Self::Permanent => "permanent",
            Self::Project => "project",
            Self::Canvas => "canvas",
        }
    }

    /// Parses a stored type name; unknown names fall back to `Fleeting`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "literature" => Self::Literature,
            "permanent" => Self::Permanent,
            "project" => Self::Project,
            "canvas" => Self::Canvas,
            _ => Self::Fleeting,
        }
    }
}

/// Lightweight card projection used for lookups and menus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub id: CardId,
    /// Title used for exact-match reference resolution.
    pub title: String,
    /// Short text excerpt, when the store derived one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl CardSummary {
    pub fn new(id: impl Into<CardId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            preview: None,
        }
    }
}

/// Full card read model returned by `CardStore::card_by_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRecord {
    pub id: CardId,
    pub title: String,
    /// Card category, stored as `type`.
    pub kind: CardType,
    /// Serialized document tree.
    pub content: String,
    /// Text projection of `content`, used for search.
    pub plain_text: String,
    pub preview: Option<String>,
    /// Outbound link ids, in first-reference order.
    pub links: Vec<CardId>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl CardRecord {
    /// Projection used in card lists.
    pub fn summary(&self) -> CardSummary {
        CardSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            preview: self.preview.clone(),
        }
    }
}

/// Partial update for one card. Each field is independently settable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    /// Serialized document tree.
    pub content: Option<String>,
    pub title: Option<String>,
    /// Full outbound link list; replaces the stored one.
    pub links: Option<Vec<CardId>>,
}

impl CardPatch {
    /// Patch touching only `content`.
    pub fn content(value: impl Into<String>) -> Self {
        Self {
            content: Some(value.into()),
            ..Self::default()
        }
    }

    /// Patch touching only `title`.
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            ..Self::default()
        }
    }

    /// Patch touching only `links`.
    pub fn links(value: Vec<CardId>) -> Self {
        Self {
            links: Some(value),
            ..Self::default()
        }
    }

    /// True when no field is set; stores skip such patches.
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.title.is_none() && self.links.is_none()
    }
}
