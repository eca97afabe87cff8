//! SQLite card repository.
//!
//! # Responsibility
//! - Implement `CardStore` on the `cards` table.
//! - Keep derived columns (`plain_text`, `preview`) in step with `content`.
//!
//! # Invariants
//! - Patch fields are applied independently; absent fields are untouched.
//! - `links` is always stored as a JSON array of card ids.
//! - Timestamps are epoch milliseconds set by SQLite.

use crate::model::card::{CardId, CardPatch, CardRecord, CardSummary, CardType};
use crate::model::document::Node;
use crate::store::{CardStore, StoreError, StoreResult};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const PREVIEW_CHARS: usize = 200;
const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

/// Card store over a migrated SQLite connection.
pub struct SqliteCardRepository {
    conn: Connection,
}

impl SqliteCardRepository {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'cards');",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(StoreError::InvalidData(
                "missing required table `cards`".to_string(),
            ));
        }
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Inserts a card with a caller-chosen id, e.g. for imports and fixtures.
    pub fn insert_card(
        &mut self,
        id: &str,
        kind: CardType,
        title: &str,
        content: &str,
    ) -> StoreResult<CardSummary> {
        let plain_text = Node::from_snapshot_or_empty(content).plain_text();
        let preview = derive_preview(&plain_text);
        self.conn.execute(
            &format!(
                "INSERT INTO cards (id, title, type, content, plain_text, preview, links, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, '[]', {NOW_MS_SQL}, {NOW_MS_SQL});"
            ),
            params![id, title, kind.as_str(), content, plain_text, preview],
        )?;
        Ok(CardSummary {
            id: id.to_string(),
            title: title.to_string(),
            preview,
        })
    }
}

impl CardStore for SqliteCardRepository {
    fn create_card(&mut self, kind: CardType, title: &str) -> StoreResult<Option<CardSummary>> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::Rejected("card title is empty".to_string()));
        }
        let id = Uuid::new_v4().to_string();
        let content = Node::empty_doc().to_snapshot();
        let card = self.insert_card(&id, kind, title, &content)?;
        info!(
            "event=card_insert module=card_repo status=ok id={} type={}",
            card.id,
            kind.as_str()
        );
        Ok(Some(card))
    }

    fn update_card(&mut self, id: &str, patch: &CardPatch) -> StoreResult<()> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut assignments: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();
        if let Some(content) = &patch.content {
            let plain_text = Node::from_snapshot_or_empty(content).plain_text();
            let preview = derive_preview(&plain_text).map_or(Value::Null, Value::Text);
            assignments.extend(["content = ?", "plain_text = ?", "preview = ?"]);
            values.extend([
                Value::Text(content.clone()),
                Value::Text(plain_text),
                preview,
            ]);
        }
        if let Some(title) = &patch.title {
            assignments.push("title = ?");
            values.push(Value::Text(title.clone()));
        }
        if let Some(links) = &patch.links {
            let encoded = serde_json::to_string(links)
                .map_err(|err| StoreError::InvalidData(format!("links encode failed: {err}")))?;
            assignments.push("links = ?");
            values.push(Value::Text(encoded));
        }
        values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE cards SET {}, updated_at = {NOW_MS_SQL} WHERE id = ?;",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!(
            "event=card_update module=card_repo status=ok id={} content={} title={} links={}",
            id,
            patch.content.is_some(),
            patch.title.is_some(),
            patch.links.is_some()
        );
        Ok(())
    }

    fn card_by_id(&self, id: &str) -> StoreResult<Option<CardRecord>> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, title, type, content, plain_text, preview, links, created_at, updated_at
                 FROM cards
                 WHERE id = ?1;",
                [id],
                RawCard::from_row,
            )
            .optional()?;
        raw.map(RawCard::into_record).transpose()
    }

    fn cards(&self) -> StoreResult<Vec<CardSummary>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, preview FROM cards ORDER BY updated_at DESC, id ASC;")?;
        let rows = stmt.query_map([], |row| {
            Ok(CardSummary {
                id: row.get("id")?,
                title: row.get("title")?,
                preview: row.get("preview")?,
            })
        })?;
        let mut cards = Vec::new();
        for card in rows {
            cards.push(card?);
        }
        Ok(cards)
    }
}

/// Row as stored, before decoding `type` and `links`.
struct RawCard {
    id: CardId,
    title: String,
    kind: String,
    content: String,
    plain_text: String,
    preview: Option<String>,
    links: String,
    created_at: i64,
    updated_at: i64,
}

impl RawCard {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            kind: row.get("type")?,
            content: row.get("content")?,
            plain_text: row.get("plain_text")?,
            preview: row.get("preview")?,
            links: row.get("links")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_record(self) -> StoreResult<CardRecord> {
        let links: Vec<CardId> = serde_json::from_str(&self.links).map_err(|err| {
            StoreError::InvalidData(format!("invalid links for card `{}`: {err}", self.id))
        })?;
        Ok(CardRecord {
            kind: CardType::parse(&self.kind),
            id: self.id,
            title: self.title,
            content: self.content,
            plain_text: self.plain_text,
            preview: self.preview,
            links,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// First `PREVIEW_CHARS` chars of the text with whitespace collapsed.
pub fn derive_preview(plain_text: &str) -> Option<String> {
    let collapsed = plain_text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(collapsed.chars().take(PREVIEW_CHARS).collect())
}
