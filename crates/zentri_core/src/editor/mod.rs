//! Live editing core.
//!
//! # Responsibility
//! - Host the components that sit between the rich-text engine and the
//!   card/asset stores: trigger menus, reference resolution, persistence
//!   channels, snapshot reconciliation, panel anchoring and image tracking.
//! - `session` wires them into one per-surface state machine.

pub mod anchor;
pub mod assets;
pub mod menu;
pub mod persistence;
pub mod reconcile;
pub mod reference;
pub mod session;
pub mod trigger;
