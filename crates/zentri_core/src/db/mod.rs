//! SQLite card database bootstrap.
//!
//! # Responsibility
//! - Open the card database (a vault file or a private in-memory copy) with
//!   the `cards` table in place, ready for `SqliteCardRepository`.
//! - Own the card schema version and its migrations.
//!
//! # Invariants
//! - The card schema version lives in `PRAGMA user_version`.
//! - A card database written by a newer build is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the card database.
#[derive(Debug)]
pub enum DbError {
    /// SQLite rejected a statement or the file could not be opened.
    Sqlite(rusqlite::Error),
    /// The directory holding the database file could not be created.
    CreateDir { path: PathBuf, source: io::Error },
    /// The file carries a card schema this build does not know.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "card database error: {err}"),
            Self::CreateDir { path, source } => write!(
                f,
                "cannot create card database directory `{}`: {source}",
                path.display()
            ),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "card database is at schema {db_version}, this build reads up to {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::CreateDir { source, .. } => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
