//! Store implementations backed by local storage.
//!
//! # Responsibility
//! - `card_repo`: cards in the SQLite database.
//! - `asset_repo`: image files inside the vault directory.
//!
//! # Invariants
//! - Repositories report failures as `StoreError`; they never log user text.

pub mod asset_repo;
pub mod card_repo;

pub use asset_repo::VaultAssetRepository;
pub use card_repo::SqliteCardRepository;
