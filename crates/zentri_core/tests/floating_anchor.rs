mod common;

use common::{at, open_session, FakeEngine, RecordingCardStore, TestSession};
use std::time::Instant;
use zentri_core::debounce::TimerKey;
use zentri_core::editor::anchor::{AnchorPosition, Layout};
use zentri_core::{DocumentEngine, Rect, Selection};

fn session_with_layout(viewport_top: f64) -> TestSession {
    let mut session = open_session(
        FakeEngine::with_paragraphs(&["hello world"]),
        RecordingCardStore::with_cards(&[]),
    );
    session.on_ready(Instant::now());
    session.set_layout(Layout {
        viewport: Rect::new(0.0, viewport_top, 1200.0, viewport_top + 800.0),
        container: Rect::new(0.0, 0.0, 1200.0, 2000.0),
    });
    session
}

#[test]
fn toolbar_follows_selection_after_debounce() {
    let start = Instant::now();
    let mut session = session_with_layout(0.0);

    session.engine_mut().set_selection(Selection::range(1, 5));
    session.on_selection_change(start);
    assert_eq!(session.toolbar_anchor(), None);

    assert_eq!(session.tick(at(start, 50)), vec![TimerKey::Anchor]);
    // Selection spans x 47..82 at y 200..218; the 360px toolbar is pushed
    // right to stay inside the container margin.
    assert_eq!(
        session.toolbar_anchor(),
        Some(AnchorPosition {
            x: 188.0,
            y: 192.0,
            show_above: true
        })
    );

    session.engine_mut().set_selection(Selection::caret(3));
    session.on_selection_change(at(start, 100));
    session.tick(at(start, 150));
    assert_eq!(session.toolbar_anchor(), None);
}

#[test]
fn toolbar_flips_below_near_viewport_top() {
    let start = Instant::now();
    let mut session = session_with_layout(150.0);

    session.engine_mut().set_selection(Selection::range(1, 5));
    session.on_selection_change(start);
    session.tick(at(start, 50));

    let anchor = session.toolbar_anchor().unwrap();
    assert!(!anchor.show_above);
    assert_eq!(anchor.y, 226.0);
}

#[test]
fn drag_suppresses_recompute_until_pointer_up() {
    let start = Instant::now();
    let mut session = session_with_layout(0.0);

    session.on_pointer_down();
    session.engine_mut().set_selection(Selection::range(1, 3));
    session.on_selection_change(start);
    session.engine_mut().set_selection(Selection::range(1, 5));
    session.on_selection_change(at(start, 20));
    assert!(!session.timers().is_pending(&TimerKey::Anchor));
    assert!(session.tick(at(start, 500)).is_empty());
    assert_eq!(session.toolbar_anchor(), None);

    session.on_pointer_up();
    assert_eq!(session.toolbar_anchor().map(|anchor| anchor.y), Some(192.0));

    // A second pointer-up without a drag changes nothing.
    session.engine_mut().set_selection(Selection::caret(2));
    session.on_pointer_up();
    assert!(session.toolbar_anchor().is_some());
}

#[test]
fn image_toolbar_uses_image_bounds() {
    let session = session_with_layout(0.0);

    let anchor = session
        .image_toolbar_anchor(Rect::new(100.0, 20.0, 500.0, 300.0))
        .unwrap();
    assert_eq!(
        anchor,
        AnchorPosition {
            x: 300.0,
            y: 308.0,
            show_above: false
        }
    );
}

#[test]
fn no_layout_means_no_toolbar() {
    let start = Instant::now();
    let mut session = open_session(
        FakeEngine::with_paragraphs(&["hello world"]),
        RecordingCardStore::with_cards(&[]),
    );
    session.on_ready(start);

    session.engine_mut().set_selection(Selection::range(1, 5));
    session.on_selection_change(start);
    session.tick(at(start, 50));
    assert_eq!(session.toolbar_anchor(), None);
    assert_eq!(
        session.image_toolbar_anchor(Rect::new(0.0, 0.0, 10.0, 10.0)),
        None
    );
}
