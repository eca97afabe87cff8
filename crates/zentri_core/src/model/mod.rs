//! Domain model shared by the editor core and the store adapters.
//!
//! # Responsibility
//! - Define the persisted document tree schema and its projections.
//! - Define card shapes exchanged with the card store.
//!
//! # Invariants
//! - The live document tree is owned by the document engine; this module
//!   only describes snapshots of it.

pub mod card;
pub mod document;
