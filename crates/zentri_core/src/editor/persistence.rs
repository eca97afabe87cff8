//! Multi-channel persistence debouncing.
//!
//! # Responsibility
//! - Track, per channel, the value waiting to be written and the last value
//!   the channel actually wrote.
//! - Arm one settle timer per channel through the shared scheduler.
//!
//! # Invariants
//! - A write is only staged when its serialized value differs from the last
//!   value that channel wrote.
//! - `last_sent` only moves forward after a successful write, so a failed
//!   value is retried the next time it is staged.
//! - Channels are independent; there is no cross-channel ordering.

use crate::config::DebounceTimings;
use crate::debounce::{DebounceScheduler, TimerKey};
use crate::model::card::{CardId, CardPatch};
use log::debug;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Independently debounced persistence stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Content,
    Title,
    Links,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Content, Channel::Title, Channel::Links];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Title => "title",
            Self::Links => "links",
        }
    }
}

/// Value carried by one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelValue {
    /// Serialized document snapshot.
    Content(String),
    Title(String),
    /// Outbound link ids in first-reference order.
    Links(Vec<CardId>),
}

impl ChannelValue {
    pub fn channel(&self) -> Channel {
        match self {
            Self::Content(_) => Channel::Content,
            Self::Title(_) => Channel::Title,
            Self::Links(_) => Channel::Links,
        }
    }

    /// Comparison form used for redundant-write suppression.
    pub fn serialized(&self) -> String {
        match self {
            Self::Content(value) | Self::Title(value) => value.clone(),
            Self::Links(ids) => ids.join("\u{1f}"),
        }
    }

    /// Store patch carrying only this channel's field.
    pub fn to_patch(&self) -> CardPatch {
        match self {
            Self::Content(value) => CardPatch::content(value.clone()),
            Self::Title(value) => CardPatch::title(value.clone()),
            Self::Links(ids) => CardPatch::links(ids.clone()),
        }
    }
}

/// A write taken off a channel, ready to send to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub channel: Channel,
    pub value: ChannelValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Scheduled,
    /// Equal to the last written value; any pending write was dropped.
    Unchanged,
}

#[derive(Debug, Default)]
struct ChannelState {
    last_sent: Option<String>,
    pending: Option<ChannelValue>,
}

#[derive(Debug)]
pub struct PersistenceDebouncer {
    states: BTreeMap<Channel, ChannelState>,
    delays: BTreeMap<Channel, Duration>,
}

impl PersistenceDebouncer {
    pub fn new(timings: &DebounceTimings) -> Self {
        let delays = BTreeMap::from([
            (Channel::Content, timings.content()),
            (Channel::Title, timings.title()),
            (Channel::Links, timings.links()),
        ]);
        let states = Channel::ALL
            .into_iter()
            .map(|channel| (channel, ChannelState::default()))
            .collect();
        Self { states, delays }
    }

    /// Records `value` as already persisted and drops any pending write.
    ///
    /// Used for the value loaded from the store and for snapshots applied
    /// from outside, both of which the store already holds.
    pub fn prime(&mut self, value: &ChannelValue, scheduler: &mut DebounceScheduler<TimerKey>) {
        let channel = value.channel();
        scheduler.cancel(&TimerKey::Channel(channel));
        let state = self.state_mut(channel);
        state.last_sent = Some(value.serialized());
        state.pending = None;
    }

    /// Cancel-and-replace staging of a new channel value.
    pub fn stage(
        &mut self,
        value: ChannelValue,
        scheduler: &mut DebounceScheduler<TimerKey>,
        now: Instant,
    ) -> StageOutcome {
        let channel = value.channel();
        let key = TimerKey::Channel(channel);
        scheduler.cancel(&key);
        let delay = self.delay(channel);

        let state = self.state_mut(channel);
        if state.last_sent.as_deref() == Some(value.serialized().as_str()) {
            state.pending = None;
            return StageOutcome::Unchanged;
        }

        state.pending = Some(value);
        scheduler.schedule(key, now, delay);
        debug!(
            "event=channel_stage module=persistence status=scheduled channel={} delay_ms={}",
            channel.as_str(),
            delay.as_millis()
        );
        StageOutcome::Scheduled
    }

    /// Takes the value whose timer just fired.
    pub fn take_pending(&mut self, channel: Channel) -> Option<PendingWrite> {
        let value = self.state_mut(channel).pending.take()?;
        Some(PendingWrite { channel, value })
    }

    /// Records a successful write.
    pub fn mark_sent(&mut self, write: &PendingWrite) {
        self.state_mut(write.channel).last_sent = Some(write.value.serialized());
    }

    pub fn last_sent(&self, channel: Channel) -> Option<&str> {
        self.states
            .get(&channel)
            .and_then(|state| state.last_sent.as_deref())
    }

    pub fn has_pending(&self, channel: Channel) -> bool {
        self.states
            .get(&channel)
            .is_some_and(|state| state.pending.is_some())
    }

    fn delay(&self, channel: Channel) -> Duration {
        self.delays.get(&channel).copied().unwrap_or_default()
    }

    fn state_mut(&mut self, channel: Channel) -> &mut ChannelState {
        self.states.entry(channel).or_default()
    }
}
