//! Live document-editing core for the Zentri knowledge base.
//!
//! The crate sits between a host UI, a rich-text engine and the card/asset
//! stores. `editor::session::EditorSession` is the entry point; the stores
//! in `repo` are the local SQLite and vault implementations.

pub mod config;
pub mod db;
pub mod debounce;
pub mod editor;
pub mod engine;
pub mod lifecycle;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use config::{ConfigError, EditorConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use editor::menu::{KeyOutcome, MenuItem, MenuKey, MenuState};
pub use editor::reconcile::ReconcileOutcome;
pub use editor::session::{EditorSession, TeardownReport};
pub use engine::{
    BlockCommand, CaretContext, DocumentEngine, HistoryMode, Rect, Selection, TextRange,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::card::{CardId, CardPatch, CardRecord, CardSummary, CardType};
pub use model::document::{Node, NodeKind, ReferenceChip};
pub use repo::{SqliteCardRepository, VaultAssetRepository};
pub use store::{AssetStore, CardStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
