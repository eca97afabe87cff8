//! Keyed debounce scheduler.
//!
//! # Responsibility
//! - Hold one deadline per key with cancel-and-replace semantics.
//! - Report due keys to the caller; the caller owns the clock.
//!
//! # Invariants
//! - At most one deadline exists per key.
//! - Keys are reported in deadline order, ties broken by key order.
//! - The scheduler never fires on its own; hosts call `take_due(now)`.

use crate::editor::persistence::Channel;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Every timer an editor session can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKey {
    /// Settle timer before a persistence write.
    Channel(Channel),
    /// Outer coalescing of raw title keystrokes.
    TitleInput,
    /// External snapshot settle timer.
    Reconcile,
    /// Formatting toolbar repositioning.
    Anchor,
    /// Image usage rescan.
    ImageScan,
}

#[derive(Debug, Clone)]
pub struct DebounceScheduler<K: Ord + Clone> {
    deadlines: BTreeMap<K, Instant>,
}

impl<K: Ord + Clone> Default for DebounceScheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> DebounceScheduler<K> {
    pub fn new() -> Self {
        Self {
            deadlines: BTreeMap::new(),
        }
    }

    /// Arms `key` to fire at `now + delay`, replacing any pending deadline.
    ///
    /// Returns the replaced deadline, if any.
    pub fn schedule(&mut self, key: K, now: Instant, delay: Duration) -> Option<Instant> {
        self.deadlines.insert(key, now + delay)
    }

    pub fn cancel(&mut self, key: &K) -> bool {
        self.deadlines.remove(key).is_some()
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.deadlines.len();
        self.deadlines.clear();
        count
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.deadlines.contains_key(key)
    }

    pub fn deadline(&self, key: &K) -> Option<Instant> {
        self.deadlines.get(key).copied()
    }

    /// Earliest pending deadline; hosts use it to arm their own wake-up.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Removes and returns every key whose deadline is at or before `now`.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let mut due: Vec<(Instant, K)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, deadline)| (*deadline, key.clone()))
            .collect();
        due.sort_by(|left, right| left.0.cmp(&right.0).then_with(|| left.1.cmp(&right.1)));
        for (_, key) in &due {
            self.deadlines.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }

    /// Removes and returns every pending key regardless of deadline.
    pub fn flush(&mut self) -> Vec<K> {
        let mut pending: Vec<(Instant, K)> = std::mem::take(&mut self.deadlines)
            .into_iter()
            .map(|(key, deadline)| (deadline, key))
            .collect();
        pending.sort_by(|left, right| left.0.cmp(&right.0).then_with(|| left.1.cmp(&right.1)));
        pending.into_iter().map(|(_, key)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
