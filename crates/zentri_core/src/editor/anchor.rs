//! Floating panel placement.
//!
//! # Responsibility
//! - Place the formatting/image toolbar above or below an anchor rectangle
//!   without crossing viewport or container edges.
//! - Place trigger menus under the caret.
//! - Gate toolbar recomputation while a drag-selection is in progress.
//!
//! # Invariants
//! - `AnchorPosition::x` is the panel's horizontal center; `y` is the panel's
//!   bottom edge when `show_above`, its top edge otherwise.
//! - A computed panel never extends past the viewport when the viewport is
//!   tall enough to hold it.

use crate::config::{AnchorConfig, PanelSize};
use crate::debounce::{DebounceScheduler, TimerKey};
use crate::engine::Rect;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPosition {
    pub x: f64,
    pub y: f64,
    pub show_above: bool,
}

/// Top-left corner of a trigger menu.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuAnchor {
    pub x: f64,
    pub y: f64,
}

/// Viewport and editing-surface bounds supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub viewport: Rect,
    pub container: Rect,
}

/// Computes where a panel of `panel` size renders around `anchor`.
pub fn compute_anchor(
    anchor: Rect,
    layout: &Layout,
    panel: PanelSize,
    config: &AnchorConfig,
) -> AnchorPosition {
    let gap = config.vertical_gap;
    let needed = panel.height + gap + config.safety_margin;
    let viewport = layout.viewport;

    let above_in_viewport = anchor.top - viewport.top;
    let above_in_container = anchor.top - layout.container.top;
    let below_in_viewport = viewport.bottom - anchor.bottom;

    let mut show_above = above_in_viewport >= needed && above_in_container >= needed;
    if !show_above && below_in_viewport < needed && above_in_viewport >= needed {
        show_above = true;
    }

    let mut y = if show_above {
        anchor.top - gap
    } else {
        anchor.bottom + gap
    };

    if show_above && y - panel.height < viewport.top {
        show_above = false;
        y = anchor.bottom + gap;
    } else if !show_above && y + panel.height > viewport.bottom {
        show_above = true;
        y = anchor.top - gap;
    }

    y = if show_above {
        clamp_low_wins(y, viewport.top + panel.height, viewport.bottom)
    } else {
        clamp_low_wins(y, viewport.top, viewport.bottom - panel.height)
    };

    AnchorPosition {
        x: horizontal_center(anchor, layout.container, panel.width, config.safety_margin),
        y,
        show_above,
    }
}

/// Menu position under the caret, never above the viewport top.
pub fn menu_anchor(caret: Rect, viewport: Rect, gap: f64) -> MenuAnchor {
    MenuAnchor {
        x: caret.left,
        y: (caret.bottom + gap).max(viewport.top),
    }
}

fn horizontal_center(anchor: Rect, container: Rect, width: f64, margin: f64) -> f64 {
    let center = (anchor.left + anchor.right) / 2.0;
    let half = width / 2.0;
    let low = container.left + half + margin;
    let high = container.right - half - margin;
    if low > high {
        return (container.left + container.right) / 2.0;
    }
    center.clamp(low, high)
}

fn clamp_low_wins(value: f64, low: f64, high: f64) -> f64 {
    if low > high {
        low
    } else {
        value.clamp(low, high)
    }
}

/// Debounces toolbar recomputation and suppresses it during drags.
#[derive(Debug, Default)]
pub struct AnchorTracker {
    dragging: bool,
}

impl AnchorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the recompute timer unless a drag is in progress.
    pub fn selection_changed(
        &self,
        scheduler: &mut DebounceScheduler<TimerKey>,
        now: Instant,
        delay: Duration,
    ) -> bool {
        if self.dragging {
            return false;
        }
        scheduler.schedule(TimerKey::Anchor, now, delay);
        true
    }

    pub fn drag_started(&mut self, scheduler: &mut DebounceScheduler<TimerKey>) {
        self.dragging = true;
        scheduler.cancel(&TimerKey::Anchor);
    }

    /// Returns `true` when a drag ended and the position must be recomputed.
    pub fn drag_ended(&mut self) -> bool {
        std::mem::replace(&mut self.dragging, false)
    }
}
