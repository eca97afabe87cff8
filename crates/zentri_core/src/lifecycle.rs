//! Editing-surface lifecycle tokens.
//!
//! # Responsibility
//! - Replace scattered "is destroyed" flags with one explicit lifecycle.
//! - Let results of external calls prove they still target the same live
//!   surface and the same document generation before they are applied.
//!
//! # Invariants
//! - Once invalidated, a lifecycle never becomes live again.
//! - Surface ids are unique per process, so tokens never cross sessions.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Proof of which surface and document epoch a pending request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceToken {
    surface: u64,
    epoch: u64,
}

#[derive(Debug)]
pub struct Lifecycle {
    surface: u64,
    epoch: u64,
    live: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            surface: NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed),
            epoch: 0,
            live: true,
        }
    }

    pub fn token(&self) -> SurfaceToken {
        SurfaceToken {
            surface: self.surface,
            epoch: self.epoch,
        }
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Token belongs to this surface and the surface is still live.
    pub fn accepts(&self, token: SurfaceToken) -> bool {
        self.live && token.surface == self.surface
    }

    /// Like `accepts`, and the document was not replaced wholesale since.
    pub fn is_current(&self, token: SurfaceToken) -> bool {
        self.accepts(token) && token.epoch == self.epoch
    }

    /// Marks a wholesale document replacement; ranges captured earlier are stale.
    pub fn advance_epoch(&mut self) {
        self.epoch += 1;
    }

    /// Returns `false` when the lifecycle was already invalidated.
    pub fn invalidate(&mut self) -> bool {
        std::mem::replace(&mut self.live, false)
    }
}

#[cfg(test)]
mod tests {
    use super::Lifecycle;

    #[test]
    fn tokens_expire_on_teardown_and_epoch_change() {
        let mut lifecycle = Lifecycle::new();
        let token = lifecycle.token();
        assert!(lifecycle.is_current(token));

        lifecycle.advance_epoch();
        assert!(lifecycle.accepts(token));
        assert!(!lifecycle.is_current(token));

        assert!(lifecycle.invalidate());
        assert!(!lifecycle.invalidate());
        assert!(!lifecycle.accepts(lifecycle.token()));
    }

    #[test]
    fn tokens_do_not_cross_surfaces() {
        let first = Lifecycle::new();
        let second = Lifecycle::new();
        assert!(!second.accepts(first.token()));
    }
}
