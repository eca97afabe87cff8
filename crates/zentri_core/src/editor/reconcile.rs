//! External snapshot reconciliation.
//!
//! # Responsibility
//! - Apply document snapshots supplied by the host to the live engine
//!   without fighting in-progress edits or losing the caret.
//! - Skip snapshots that are identical to the live document or that echo
//!   this surface's own writes.
//!
//! # Invariants
//! - A focused, non-empty document is never replaced.
//! - A snapshot equal to the last synced one is never applied twice.
//! - A snapshot equal to any of the last `RECENT_WRITES` local writes is an
//!   echo, even when it arrives after a newer write.
//! - Deferred snapshots are kept until a later offer replaces them or a
//!   later evaluation (settle timer or blur) applies them.
//!
//! Known limitation: this is last-write-wins with a single-writer
//! assumption. A snapshot deferred while the user keeps typing is only
//! applied once the surface is empty or unfocused, and applying it then
//! discards unsaved local edits. No merge is attempted.

use crate::debounce::{DebounceScheduler, TimerKey};
use crate::engine::{DocumentEngine, HistoryMode, Selection};
use crate::model::document::Node;
use log::{debug, info};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Local writes remembered for echo detection.
const RECENT_WRITES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    NothingPending,
    /// Live document already equals the snapshot.
    Unchanged,
    /// Snapshot equals the last synced one or a recent local write.
    SkippedOwnSnapshot,
    /// Surface is focused and non-empty; snapshot kept for later.
    Deferred,
    Applied { caret_restored: bool },
}

#[derive(Debug, Default)]
pub struct ContentReconciler {
    incoming: Option<String>,
    last_synced: Option<String>,
    /// Oldest first.
    own_writes: VecDeque<String>,
}

impl ContentReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the snapshot the surface was loaded with.
    pub fn prime(&mut self, snapshot: String) {
        self.last_synced = Some(snapshot);
    }

    /// Records a snapshot this surface wrote to the store, so its echo from
    /// the host is recognized and skipped.
    pub fn note_local_write(&mut self, snapshot: &str) {
        self.last_synced = Some(snapshot.to_string());
        if self.own_writes.back().map(String::as_str) == Some(snapshot) {
            return;
        }
        if self.own_writes.len() == RECENT_WRITES {
            self.own_writes.pop_front();
        }
        self.own_writes.push_back(snapshot.to_string());
    }

    fn is_own(&self, snapshot: &str) -> bool {
        self.last_synced.as_deref() == Some(snapshot)
            || self.own_writes.iter().any(|write| write == snapshot)
    }

    pub fn last_synced(&self) -> Option<&str> {
        self.last_synced.as_deref()
    }

    /// Whether a snapshot is waiting for the next evaluation.
    pub fn has_incoming(&self) -> bool {
        self.incoming.is_some()
    }

    /// Accepts a host snapshot and (re)arms the settle timer.
    pub fn offer(
        &mut self,
        raw: String,
        scheduler: &mut DebounceScheduler<TimerKey>,
        now: Instant,
        delay: Duration,
    ) {
        self.incoming = Some(raw);
        scheduler.schedule(TimerKey::Reconcile, now, delay);
    }

    /// Drops the pending snapshot, e.g. on teardown.
    pub fn discard_incoming(&mut self) {
        self.incoming = None;
    }

    /// Runs the reconciliation policy against the live engine.
    pub fn evaluate<E: DocumentEngine>(&mut self, engine: &mut E) -> ReconcileOutcome {
        let Some(raw) = self.incoming.as_deref() else {
            return ReconcileOutcome::NothingPending;
        };

        let incoming_doc = Node::from_snapshot_or_empty(raw);
        let incoming = incoming_doc.to_snapshot();
        let live_doc = engine.document();

        if live_doc.to_snapshot() == incoming {
            self.last_synced = Some(incoming);
            self.incoming = None;
            return ReconcileOutcome::Unchanged;
        }

        if self.is_own(&incoming) {
            self.incoming = None;
            debug!("event=reconcile module=reconcile status=skip reason=own_snapshot");
            return ReconcileOutcome::SkippedOwnSnapshot;
        }

        let was_empty = live_doc.is_structurally_empty();
        if !was_empty && engine.has_focus() {
            debug!("event=reconcile module=reconcile status=deferred reason=active_focus");
            return ReconcileOutcome::Deferred;
        }

        let caret = engine.selection().head;
        let new_length = incoming_doc.content_size();
        engine.set_document(incoming_doc, HistoryMode::Skip);

        let caret_restored = was_empty && engine.has_focus();
        if caret_restored {
            engine.set_selection(Selection::caret(caret.min(new_length)));
        }

        info!(
            "event=reconcile module=reconcile status=applied snapshot_len={} was_empty={} caret_restored={}",
            incoming.len(),
            was_empty,
            caret_restored
        );
        self.last_synced = Some(incoming);
        self.incoming = None;
        ReconcileOutcome::Applied { caret_restored }
    }
}
