//! External store contracts consumed by the editor core.
//!
//! # Responsibility
//! - Define the card store (`create/update/get/list`) and asset store
//!   (`save/url/delete`) seams the editor session talks through.
//! - Provide one error type shared by every store adapter.
//!
//! # Invariants
//! - Store calls are last-write-wins; no transaction spans channels.
//! - A `create_card` that returns `Ok(None)` is a rejected creation, not an
//!   error; callers treat both the same way.

use crate::db::DbError;
use crate::model::card::{CardPatch, CardRecord, CardSummary, CardType};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Card persistence backend.
pub trait CardStore {
    /// Creates a card with empty content.
    fn create_card(&mut self, kind: CardType, title: &str) -> StoreResult<Option<CardSummary>>;
    /// Applies the fields present in `patch`.
    fn update_card(&mut self, id: &str, patch: &CardPatch) -> StoreResult<()>;
    fn card_by_id(&self, id: &str) -> StoreResult<Option<CardRecord>>;
    /// Every card, for title lookups and menus.
    fn cards(&self) -> StoreResult<Vec<CardSummary>>;
}

/// Out-of-document image storage.
pub trait AssetStore {
    /// Stores image bytes and returns the vault-relative path.
    fn save_image(&mut self, bytes: &[u8], filename: &str) -> StoreResult<String>;
    /// Display URL for a stored image.
    fn image_url(&self, relative_path: &str) -> String;
    /// Deletes a stored image; deleting a missing image succeeds.
    fn delete_image(&mut self, relative_path: &str) -> StoreResult<()>;
}

#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Io(std::io::Error),
    NotFound(String),
    InvalidData(String),
    /// The backend refused the request (validation, permissions, ...).
    Rejected(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::Rejected(message) => write!(f, "request rejected: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::Rejected(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
