//! Per-surface editing session.
//!
//! # Responsibility
//! - Own every piece of editor-core state for one editing surface and route
//!   engine events, host inputs and timer expiries to the right component.
//! - Talk to the card and asset stores, degrading every failure to a log
//!   line and no visible effect.
//!
//! # Invariants
//! - After `teardown` every entry point is a no-op; results of external
//!   calls that arrive later are dropped (an image saved too late is deleted).
//! - Only one menu is open at a time and keys reach it only while open.
//! - Timers fire only from `tick`; the host drives the clock.
//!
//! The session never forwards engine events to itself. Hosts call
//! `on_update` / `on_selection_change` after every engine event, including
//! the ones caused by the session's own edits.

use crate::config::EditorConfig;
use crate::debounce::{DebounceScheduler, TimerKey};
use crate::editor::anchor::{
    compute_anchor, menu_anchor, AnchorPosition, AnchorTracker, Layout, MenuAnchor,
};
use crate::editor::assets::ImageUsageTracker;
use crate::editor::menu::{
    CommandAction, Commit, KeyOutcome, MenuCoordinator, MenuItem, MenuKey, MenuState,
    MenuTransition,
};
use crate::editor::persistence::{Channel, ChannelValue, PersistenceDebouncer};
use crate::editor::reconcile::{ContentReconciler, ReconcileOutcome};
use crate::editor::reference::{outbound_links, reference_chip, resolve_pending_chips};
use crate::editor::trigger::{detect_completed_reference, detect_trigger};
use crate::engine::{CaretContext, DocumentEngine, HistoryMode, Rect, Selection, TextRange};
use crate::lifecycle::{Lifecycle, SurfaceToken};
use crate::model::card::{CardId, CardSummary, CardType};
use crate::model::document::{Node, ReferenceChip};
use crate::store::{AssetStore, CardStore, StoreResult};
use log::{debug, error, info, warn};
use std::time::Instant;

/// A card creation started from the reference menu.
///
/// The trigger text is already stripped when this exists; `finish` inserts
/// the chip at `position` if the surface is still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCardCreation {
    token: SurfaceToken,
    position: usize,
    /// Type the new card is created with.
    pub kind: CardType,
    /// Trimmed title typed after `[[`.
    pub title: String,
}

/// An image save started by `begin_image_insert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingImageSave {
    token: SurfaceToken,
}

/// What teardown did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Channels written during the flush.
    pub flushed: Vec<Channel>,
    /// Orphaned images removed from the asset store.
    pub deleted_images: Vec<String>,
    /// Orphaned images the asset store failed to remove.
    pub failed_deletes: usize,
    /// Timers dropped without running their action.
    pub cancelled_timers: usize,
}

/// Editor core for one editing surface of one card.
///
/// Generic over the document engine and the two stores so hosts and tests
/// can plug in their own implementations.
pub struct EditorSession<E, C, A>
where
    E: DocumentEngine,
    C: CardStore,
    A: AssetStore,
{
    card_id: CardId,
    engine: E,
    card_store: C,
    asset_store: A,
    config: EditorConfig,
    lifecycle: Lifecycle,
    timers: DebounceScheduler<TimerKey>,
    menu: MenuCoordinator,
    channels: PersistenceDebouncer,
    reconciler: ContentReconciler,
    anchor: AnchorTracker,
    images: ImageUsageTracker,
    cards: Vec<CardSummary>,
    layout: Option<Layout>,
    toolbar: Option<AnchorPosition>,
    pending_title: Option<String>,
    /// Caret text seen at the last engine event, used to tell typing apart
    /// from deletions and undo.
    last_caret: Option<CaretContext>,
    ready: bool,
}

impl<E, C, A> EditorSession<E, C, A>
where
    E: DocumentEngine,
    C: CardStore,
    A: AssetStore,
{
    /// Creates a live session for `card_id` and loads the card list.
    ///
    /// Channels, the reconciler and image tracking are baselined later, by
    /// `on_ready`.
    pub fn new(
        card_id: impl Into<CardId>,
        engine: E,
        card_store: C,
        asset_store: A,
        config: EditorConfig,
    ) -> Self {
        let card_id = card_id.into();
        let mut session = Self {
            channels: PersistenceDebouncer::new(&config.timings),
            menu: MenuCoordinator::new(config.menu.reference_limit),
            card_id,
            engine,
            card_store,
            asset_store,
            config,
            lifecycle: Lifecycle::new(),
            timers: DebounceScheduler::new(),
            reconciler: ContentReconciler::new(),
            anchor: AnchorTracker::new(),
            images: ImageUsageTracker::new(),
            cards: Vec::new(),
            layout: None,
            toolbar: None,
            pending_title: None,
            last_caret: None,
            ready: false,
        };
        session.remember_caret();
        session.refresh_cards();
        session
    }

    /// Id of the card this surface edits.
    pub fn card_id(&self) -> &str {
        &self.card_id
    }

    /// The wrapped document engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Direct engine access for host-driven edits (typing, pasting).
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// The card store writes and lookups go to.
    pub fn card_store(&self) -> &C {
        &self.card_store
    }

    /// Mutable card store access, e.g. for host-side card management.
    pub fn card_store_mut(&mut self) -> &mut C {
        &mut self.card_store
    }

    /// The asset store images are saved to and deleted from.
    pub fn asset_store(&self) -> &A {
        &self.asset_store
    }

    /// Configuration the session was created with.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// `false` once `teardown` ran.
    pub fn is_live(&self) -> bool {
        self.lifecycle.is_live()
    }

    /// Whether the first-ready pass ran.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Current trigger menu, for rendering.
    pub fn menu_state(&self) -> &MenuState {
        self.menu.state()
    }

    /// Cards known to reference lookups and the reference menu.
    pub fn cards(&self) -> &[CardSummary] {
        &self.cards
    }

    /// Pending timers of this session.
    pub fn timers(&self) -> &DebounceScheduler<TimerKey> {
        &self.timers
    }

    /// Image usage sets of the document.
    pub fn images(&self) -> &ImageUsageTracker {
        &self.images
    }

    /// Earliest pending timer; the host should call `tick` at or after it.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Reloads the card list used for lookups. Keeps the old list on failure.
    pub fn refresh_cards(&mut self) -> bool {
        match self.card_store.cards() {
            Ok(cards) => {
                self.cards = cards;
                true
            }
            Err(err) => {
                warn!(
                    "event=cards_refresh module=session status=error card_id={} error={}",
                    self.card_id, err
                );
                false
            }
        }
    }

    /// Replaces the card list with one pushed by the host.
    pub fn set_cards(&mut self, cards: Vec<CardSummary>) {
        self.cards = cards;
    }

    /// First-ready pass: baselines channels, the reconciler and the image
    /// set, then resolves chips written before their target existed.
    pub fn on_ready(&mut self, now: Instant) {
        if !self.lifecycle.is_live() || self.ready {
            return;
        }
        self.ready = true;
        self.refresh_cards();

        let mut document = self.engine.document();
        let loaded = document.to_snapshot();
        self.channels
            .prime(&ChannelValue::Content(loaded.clone()), &mut self.timers);
        self.channels.prime(
            &ChannelValue::Links(outbound_links(&document, &self.cards)),
            &mut self.timers,
        );
        self.reconciler.prime(loaded);
        self.images.load(&document);

        match self.card_store.card_by_id(&self.card_id) {
            Ok(Some(record)) => self
                .channels
                .prime(&ChannelValue::Title(record.title), &mut self.timers),
            Ok(None) => warn!(
                "event=editor_ready module=session status=missing_card card_id={}",
                self.card_id
            ),
            Err(err) => warn!(
                "event=editor_ready module=session status=error card_id={} error={}",
                self.card_id, err
            ),
        }

        let card_store = &self.card_store;
        let rewritten = resolve_pending_chips(&mut document, &self.cards, |id| {
            card_store
                .card_by_id(id)
                .ok()
                .flatten()
                .map(|record| record.summary())
        });
        if rewritten > 0 {
            let selection = self.engine.selection();
            self.engine.set_document(document, HistoryMode::Skip);
            self.engine.set_selection(selection);
            self.stage_document(now);
        }
        self.remember_caret();

        info!(
            "event=editor_ready module=session status=ok card_id={} cards={} chips_resolved={} images={}",
            self.card_id,
            self.cards.len(),
            rewritten,
            self.images.current().len()
        );
    }

    /// Engine `update` event.
    pub fn on_update(&mut self, now: Instant) {
        if !self.lifecycle.is_live() {
            return;
        }
        self.apply_completed_reference();
        self.detect_menu();
        self.stage_document(now);
        self.images.schedule_rescan(
            &mut self.timers,
            now,
            self.config.timings.image_scan(),
        );
        self.remember_caret();
    }

    /// Engine `selectionChange` event.
    pub fn on_selection_change(&mut self, now: Instant) {
        if !self.lifecycle.is_live() {
            return;
        }
        self.detect_menu();
        self.anchor
            .selection_changed(&mut self.timers, now, self.config.timings.anchor());
        self.remember_caret();
    }

    /// Keyboard input while the surface has focus. Returns `NotHandled`
    /// when the engine should process the key itself.
    pub fn on_key(&mut self, key: MenuKey) -> KeyOutcome {
        if !self.lifecycle.is_live() {
            return KeyOutcome::NotHandled;
        }
        let outcome = self.menu.handle_key(key);
        if let KeyOutcome::Commit(commit) = &outcome {
            self.apply_commit(commit.clone());
        }
        outcome
    }

    /// Pointer selection of menu item `index`.
    pub fn select_menu_item(&mut self, index: usize) -> bool {
        if !self.lifecycle.is_live() {
            return false;
        }
        match self.menu.select(index) {
            Some(commit) => {
                self.apply_commit(commit);
                true
            }
            None => false,
        }
    }

    /// Closes any open menu without touching the document.
    pub fn close_menu(&mut self) -> bool {
        self.menu.close()
    }

    /// Raw title keystrokes, coalesced before reaching the title channel.
    pub fn on_title_input(&mut self, raw: impl Into<String>, now: Instant) {
        if !self.lifecycle.is_live() {
            return;
        }
        self.pending_title = Some(raw.into());
        self.timers
            .schedule(TimerKey::TitleInput, now, self.config.timings.title_input());
    }

    /// Host-supplied document snapshot (the card's stored content).
    pub fn on_external_content(&mut self, raw: impl Into<String>, now: Instant) {
        if !self.lifecycle.is_live() {
            return;
        }
        self.reconciler.offer(
            raw.into(),
            &mut self.timers,
            now,
            self.config.timings.reconcile(),
        );
    }

    /// Focus loss forces a reconciliation pass.
    pub fn on_blur(&mut self) -> ReconcileOutcome {
        if !self.lifecycle.is_live() {
            return ReconcileOutcome::NothingPending;
        }
        self.timers.cancel(&TimerKey::Reconcile);
        self.run_reconcile()
    }

    /// Starts a drag-selection; toolbar recomputation waits for pointer-up.
    pub fn on_pointer_down(&mut self) {
        if self.lifecycle.is_live() {
            self.anchor.drag_started(&mut self.timers);
        }
    }

    /// Ends a drag-selection and recomputes the toolbar once.
    pub fn on_pointer_up(&mut self) {
        if self.lifecycle.is_live() && self.anchor.drag_ended() {
            self.recompute_toolbar();
        }
    }

    /// Viewport and container bounds used for every anchor computation.
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = Some(layout);
    }

    /// Formatting toolbar position for the current non-empty selection.
    pub fn toolbar_anchor(&self) -> Option<AnchorPosition> {
        self.toolbar
    }

    /// Image toolbar position for an image element's bounds.
    pub fn image_toolbar_anchor(&self, image_bounds: Rect) -> Option<AnchorPosition> {
        let layout = self.layout.as_ref()?;
        Some(compute_anchor(
            image_bounds,
            layout,
            self.config.anchor.image_toolbar,
            &self.config.anchor,
        ))
    }

    /// Fires every timer due at `now`. Returns the fired keys in order.
    pub fn tick(&mut self, now: Instant) -> Vec<TimerKey> {
        if !self.lifecycle.is_live() {
            return Vec::new();
        }
        let due = self.timers.take_due(now);
        for key in &due {
            self.fire(*key, now);
        }
        due
    }

    /// Starts a card creation for the `create new` menu entry and strips
    /// the trigger text.
    pub fn begin_card_creation(
        &mut self,
        range: TextRange,
        title: impl Into<String>,
    ) -> Option<PendingCardCreation> {
        if !self.lifecycle.is_live() {
            return None;
        }
        self.engine.replace_range(range, Vec::new());
        self.engine.set_selection(Selection::caret(range.from));
        self.remember_caret();
        Some(PendingCardCreation {
            token: self.lifecycle.token(),
            position: range.from,
            kind: self.config.menu.new_card_type,
            title: title.into(),
        })
    }

    /// Applies a card creation result. Returns the inserted chip.
    pub fn finish_card_creation(
        &mut self,
        pending: PendingCardCreation,
        result: StoreResult<Option<CardSummary>>,
    ) -> Option<ReferenceChip> {
        let card = match result {
            Ok(Some(card)) => card,
            Ok(None) => {
                warn!(
                    "event=card_create module=session status=rejected card_id={}",
                    self.card_id
                );
                return None;
            }
            Err(err) => {
                warn!(
                    "event=card_create module=session status=error card_id={} error={}",
                    self.card_id, err
                );
                return None;
            }
        };

        if !self.cards.iter().any(|known| known.id == card.id) {
            self.cards.push(card.clone());
        }
        if !self.lifecycle.is_current(pending.token) {
            debug!(
                "event=card_create module=session status=stale created_id={}",
                card.id
            );
            return None;
        }
        if pending.position > self.engine.document().content_size() {
            warn!(
                "event=card_create module=session status=stale_position created_id={}",
                card.id
            );
            return None;
        }

        let chip = ReferenceChip::resolved(card.title.clone(), card.id.clone());
        self.insert_chip(TextRange::new(pending.position, pending.position), chip.clone());
        info!(
            "event=card_create module=session status=ok card_id={} created_id={}",
            self.card_id, card.id
        );
        Some(chip)
    }

    /// Starts an image save; `None` once the surface is torn down.
    pub fn begin_image_insert(&self) -> Option<PendingImageSave> {
        self.lifecycle.is_live().then(|| PendingImageSave {
            token: self.lifecycle.token(),
        })
    }

    /// Inserts a saved image at the selection. A save that completes after
    /// teardown is deleted again. Returns the vault-relative path.
    pub fn finish_image_insert(
        &mut self,
        pending: PendingImageSave,
        result: StoreResult<String>,
    ) -> Option<String> {
        let relative_path = match result {
            Ok(path) => path,
            Err(err) => {
                warn!(
                    "event=image_save module=session status=error card_id={} error={}",
                    self.card_id, err
                );
                return None;
            }
        };

        if !self.lifecycle.accepts(pending.token) {
            match self.asset_store.delete_image(&relative_path) {
                Ok(()) => debug!(
                    "event=image_save module=session status=stale_deleted card_id={}",
                    self.card_id
                ),
                Err(err) => warn!(
                    "event=image_save module=session status=stale_delete_error card_id={} error={}",
                    self.card_id, err
                ),
            }
            return None;
        }

        let url = self.asset_store.image_url(&relative_path);
        self.engine
            .insert_at_selection(vec![Node::image(url, Some(relative_path.as_str()))]);
        self.remember_caret();
        info!(
            "event=image_insert module=session status=ok card_id={}",
            self.card_id
        );
        Some(relative_path)
    }

    /// Saves `bytes` through the asset store and inserts the image.
    pub fn insert_image(&mut self, bytes: &[u8], filename: &str) -> Option<String> {
        let pending = self.begin_image_insert()?;
        let result = self.asset_store.save_image(bytes, filename);
        self.finish_image_insert(pending, result)
    }

    /// Flushes or cancels pending work, deletes orphaned images and ends the
    /// lifecycle. A second call does nothing.
    pub fn teardown(&mut self, now: Instant) -> TeardownReport {
        let mut report = TeardownReport::default();
        if !self.lifecycle.is_live() {
            return report;
        }

        let pending = self.timers.flush();
        if self.config.flush_on_teardown {
            if pending.contains(&TimerKey::TitleInput) {
                self.stage_title(now);
            }
            for channel in Channel::ALL {
                if self.channels.has_pending(channel) && self.write_channel(channel) {
                    report.flushed.push(channel);
                }
            }
            report.cancelled_timers = pending
                .iter()
                .filter(|key| !matches!(key, TimerKey::Channel(_) | TimerKey::TitleInput))
                .count();
        } else {
            report.cancelled_timers = pending.len();
        }

        self.images.rescan(&self.engine.document());
        for path in self.images.orphaned() {
            match self.asset_store.delete_image(&path) {
                Ok(()) => report.deleted_images.push(path),
                Err(err) => {
                    report.failed_deletes += 1;
                    warn!(
                        "event=image_cleanup module=session status=error card_id={} error={}",
                        self.card_id, err
                    );
                }
            }
        }

        // Staging during the flush may have re-armed channel timers.
        self.timers.cancel_all();
        let dropped_snapshot = self.reconciler.has_incoming();
        self.reconciler.discard_incoming();
        self.menu.close();
        self.pending_title = None;
        self.toolbar = None;
        self.lifecycle.invalidate();

        info!(
            "event=editor_teardown module=session status=ok card_id={} flushed={} images_added={} images_deleted={} images_failed={} timers_cancelled={} dropped_snapshot={}",
            self.card_id,
            report.flushed.len(),
            self.images.added().len(),
            report.deleted_images.len(),
            report.failed_deletes,
            report.cancelled_timers,
            dropped_snapshot
        );
        report
    }

    fn fire(&mut self, key: TimerKey, now: Instant) {
        match key {
            TimerKey::Channel(channel) => {
                self.write_channel(channel);
            }
            TimerKey::TitleInput => self.stage_title(now),
            TimerKey::Reconcile => {
                self.run_reconcile();
            }
            TimerKey::Anchor => self.recompute_toolbar(),
            TimerKey::ImageScan => self.images.rescan(&self.engine.document()),
        }
    }

    fn stage_document(&mut self, now: Instant) {
        let document = self.engine.document();
        let links = outbound_links(&document, &self.cards);
        self.channels.stage(
            ChannelValue::Content(document.to_snapshot()),
            &mut self.timers,
            now,
        );
        self.channels
            .stage(ChannelValue::Links(links), &mut self.timers, now);
    }

    fn stage_title(&mut self, now: Instant) {
        let Some(raw) = self.pending_title.take() else {
            return;
        };
        let title = raw.trim();
        if title.is_empty() {
            debug!(
                "event=title_stage module=session status=skip reason=empty card_id={}",
                self.card_id
            );
            return;
        }
        self.channels
            .stage(ChannelValue::Title(title.to_string()), &mut self.timers, now);
    }

    /// Sends a channel's pending value. Returns whether a write succeeded.
    fn write_channel(&mut self, channel: Channel) -> bool {
        let Some(write) = self.channels.take_pending(channel) else {
            return false;
        };
        match self
            .card_store
            .update_card(&self.card_id, &write.value.to_patch())
        {
            Ok(()) => {
                self.channels.mark_sent(&write);
                if let ChannelValue::Content(snapshot) = &write.value {
                    self.reconciler.note_local_write(snapshot);
                }
                debug!(
                    "event=channel_write module=session status=ok card_id={} channel={}",
                    self.card_id,
                    channel.as_str()
                );
                true
            }
            Err(err) => {
                error!(
                    "event=channel_write module=session status=error card_id={} channel={} error={}",
                    self.card_id,
                    channel.as_str(),
                    err
                );
                false
            }
        }
    }

    fn run_reconcile(&mut self) -> ReconcileOutcome {
        let outcome = self.reconciler.evaluate(&mut self.engine);
        if let ReconcileOutcome::Applied { .. } = outcome {
            self.lifecycle.advance_epoch();
            self.menu.close();
            let document = self.engine.document();
            self.channels.prime(
                &ChannelValue::Content(document.to_snapshot()),
                &mut self.timers,
            );
            self.channels.prime(
                &ChannelValue::Links(outbound_links(&document, &self.cards)),
                &mut self.timers,
            );
            self.images.rescan(&document);
            self.remember_caret();
        }
        outcome
    }

    /// Turns a `[[Title]]` closed by the text just typed into a chip.
    fn apply_completed_reference(&mut self) {
        let Some(context) = self.engine.caret_context() else {
            return;
        };
        if !self.inserted_at_caret(&context) {
            return;
        }
        let Some(completed) = detect_completed_reference(&context) else {
            return;
        };
        let chip = reference_chip(&completed.title, &self.cards);
        debug!(
            "event=reference_insert module=session status=ok source=input_rule exists={}",
            chip.exists
        );
        self.insert_chip(completed.range, chip);
    }

    /// True when the caret text grew in place since the last event, i.e. the
    /// update inserted text right before the caret. Deletions, undo and caret
    /// moves do not qualify.
    fn inserted_at_caret(&self, context: &CaretContext) -> bool {
        let Some(last) = &self.last_caret else {
            return false;
        };
        let grown_chars = context
            .text_before
            .chars()
            .count()
            .checked_sub(last.text_before.chars().count());
        context.position > last.position
            && context.text_before.starts_with(&last.text_before)
            && grown_chars == Some(context.position - last.position)
    }

    fn remember_caret(&mut self) {
        self.last_caret = self.engine.caret_context();
    }

    fn insert_chip(&mut self, range: TextRange, chip: ReferenceChip) {
        self.engine.replace_range(range, vec![chip.into_node()]);
        self.engine.set_selection(Selection::caret(range.from + 1));
        self.remember_caret();
    }

    fn detect_menu(&mut self) {
        let context = self.engine.caret_context();
        let trigger = context.as_ref().and_then(detect_trigger);
        let anchor = context
            .as_ref()
            .and_then(|context| self.menu_anchor_at(context.position));
        let transition = self.menu.observe(trigger, &self.cards, anchor);
        match transition {
            MenuTransition::StayedIdle | MenuTransition::Updated(_) => {}
            other => debug!("event=menu_transition module=session status={other:?}"),
        }
    }

    fn menu_anchor_at(&self, position: usize) -> Option<MenuAnchor> {
        let caret = self.engine.rect_for_position(position)?;
        let gap = self.config.anchor.menu_gap;
        Some(match &self.layout {
            Some(layout) => menu_anchor(caret, layout.viewport, gap),
            None => MenuAnchor {
                x: caret.left,
                y: caret.bottom + gap,
            },
        })
    }

    fn recompute_toolbar(&mut self) {
        let selection = self.engine.selection();
        self.toolbar = if selection.is_empty() {
            None
        } else {
            self.selection_bounds(selection).and_then(|bounds| {
                let layout = self.layout.as_ref()?;
                Some(compute_anchor(
                    bounds,
                    layout,
                    self.config.anchor.toolbar,
                    &self.config.anchor,
                ))
            })
        };
    }

    fn selection_bounds(&self, selection: Selection) -> Option<Rect> {
        let start = self.engine.rect_for_position(selection.from())?;
        let end = self.engine.rect_for_position(selection.to())?;
        Some(start.union(&end))
    }

    fn apply_commit(&mut self, commit: Commit) {
        match commit.item {
            MenuItem::Card(card) => {
                let chip = ReferenceChip::resolved(card.title, card.id);
                debug!(
                    "event=reference_insert module=session status=ok source=menu exists={}",
                    chip.exists
                );
                self.insert_chip(commit.range, chip);
            }
            MenuItem::CreateCard { title } => {
                let Some(pending) = self.begin_card_creation(commit.range, title) else {
                    return;
                };
                let result = self.card_store.create_card(pending.kind, &pending.title);
                self.finish_card_creation(pending, result);
            }
            MenuItem::Command(item) => {
                self.engine.replace_range(commit.range, Vec::new());
                self.engine.set_selection(Selection::caret(commit.range.from));
                match item.action {
                    CommandAction::Block(command) => {
                        if !self.engine.run_command(&command) {
                            warn!(
                                "event=block_command module=session status=rejected command={}",
                                command.name()
                            );
                        }
                    }
                    CommandAction::OpenReference => {
                        self.engine.insert_at_selection(vec![Node::text("[[")]);
                        self.detect_menu();
                    }
                }
                self.remember_caret();
            }
        }
    }
}
