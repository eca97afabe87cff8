mod common;

use common::{at, open_session, open_session_with, FakeEngine, RecordingCardStore, SELF_ID};
use std::time::Instant;
use zentri_core::config::EditorConfig;
use zentri_core::debounce::TimerKey;
use zentri_core::editor::persistence::Channel;
use zentri_core::model::document::Node;
use zentri_core::{DocumentEngine, TeardownReport};

#[test]
fn rapid_edits_produce_one_write_with_the_final_value() {
    let start = Instant::now();
    let mut session = open_session(
        FakeEngine::with_paragraphs(&[""]),
        RecordingCardStore::with_cards(&[]),
    );
    session.on_ready(start);

    for (step, letter) in ["a", "b", "c"].into_iter().enumerate() {
        session.engine_mut().type_text(letter);
        session.on_update(at(start, step as u64 * 100));
    }

    session.tick(at(start, 499));
    assert!(session.card_store().content_writes().is_empty());

    session.tick(at(start, 500));
    let writes = session.card_store().content_writes();
    assert_eq!(writes.len(), 1);
    let written = Node::parse_snapshot(&writes[0]).unwrap();
    assert_eq!(written.plain_text(), "abc");
    assert!(session
        .card_store()
        .updates
        .iter()
        .all(|(id, _)| id == SELF_ID));

    session.tick(at(start, 5_000));
    assert_eq!(session.card_store().content_writes().len(), 1);
}

#[test]
fn unchanged_document_is_not_written() {
    let start = Instant::now();
    let mut session = open_session(
        FakeEngine::with_paragraphs(&["same"]),
        RecordingCardStore::with_cards(&[]),
    );
    session.on_ready(start);

    session.on_update(start);
    assert!(!session
        .timers()
        .is_pending(&TimerKey::Channel(Channel::Content)));
    session.tick(at(start, 1_000));
    assert!(session.card_store().updates.is_empty());
}

#[test]
fn failed_write_is_retried_on_the_next_change() {
    let start = Instant::now();
    let mut store = RecordingCardStore::with_cards(&[]);
    store.fail_updates = true;
    let mut session = open_session(FakeEngine::with_paragraphs(&[""]), store);
    session.on_ready(start);

    session.engine_mut().type_text("x");
    session.on_update(start);
    session.tick(at(start, 300));
    assert_eq!(session.card_store().failed_updates, 1);
    assert!(session.card_store().updates.is_empty());

    // Same value staged again: the failed write did not move the marker.
    session.card_store_mut().fail_updates = false;
    session.on_update(at(start, 400));
    session.tick(at(start, 700));
    let writes = session.card_store().content_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(Node::parse_snapshot(&writes[0]).unwrap().plain_text(), "x");
}

#[test]
fn title_is_coalesced_then_debounced() {
    let start = Instant::now();
    let mut session = open_session(
        FakeEngine::with_paragraphs(&[""]),
        RecordingCardStore::with_cards(&[]),
    );
    session.on_ready(start);

    session.on_title_input("Dra", start);
    session.on_title_input("Draft title ", at(start, 100));

    session.tick(at(start, 899));
    assert!(!session
        .timers()
        .is_pending(&TimerKey::Channel(Channel::Title)));

    session.tick(at(start, 900));
    assert!(session
        .timers()
        .is_pending(&TimerKey::Channel(Channel::Title)));
    session.tick(at(start, 1_199));
    assert!(session.card_store().title_writes().is_empty());

    session.tick(at(start, 1_200));
    assert_eq!(session.card_store().title_writes(), vec!["Draft title"]);
}

#[test]
fn stored_and_empty_titles_are_not_written() {
    let start = Instant::now();
    let mut session = open_session(
        FakeEngine::with_paragraphs(&[""]),
        RecordingCardStore::with_cards(&[]),
    );
    session.on_ready(start);

    // The stored title is "Inbox".
    session.on_title_input(" Inbox ", start);
    session.tick(at(start, 800));
    session.tick(at(start, 1_100));

    session.on_title_input("   ", at(start, 2_000));
    session.tick(at(start, 2_800));
    session.tick(at(start, 3_100));

    assert!(session.card_store().title_writes().is_empty());
}

#[test]
fn channels_keep_their_own_timers() {
    let start = Instant::now();
    let mut session = open_session(
        FakeEngine::with_paragraphs(&[""]),
        RecordingCardStore::with_cards(&[("card-a", "Alpha")]),
    );
    session.on_ready(start);

    session.engine_mut().type_text("[[Alpha]]");
    session.on_update(start);

    assert_eq!(
        session.tick(at(start, 300)),
        vec![TimerKey::ImageScan, TimerKey::Channel(Channel::Content)]
    );
    assert_eq!(session.card_store().content_writes().len(), 1);
    assert!(session.card_store().link_writes().is_empty());

    assert_eq!(
        session.tick(at(start, 500)),
        vec![TimerKey::Channel(Channel::Links)]
    );
    assert_eq!(
        session.card_store().link_writes(),
        vec![vec!["card-a".to_string()]]
    );
}

#[test]
fn teardown_flushes_pending_writes_and_stops_everything() {
    let start = Instant::now();
    let mut session = open_session(
        FakeEngine::with_paragraphs(&[""]),
        RecordingCardStore::with_cards(&[]),
    );
    session.on_ready(start);

    session.engine_mut().type_text("last words");
    session.on_update(start);
    session.on_title_input("Final", start);

    let report = session.teardown(at(start, 10));
    assert_eq!(report.flushed, vec![Channel::Content, Channel::Title]);
    // Only the image rescan was dropped; the rest ran as writes.
    assert_eq!(report.cancelled_timers, 1);
    assert_eq!(session.card_store().title_writes(), vec!["Final"]);
    assert_eq!(session.card_store().content_writes().len(), 1);
    assert!(session.timers().is_empty());
    assert!(!session.is_live());

    let writes = session.card_store().updates.len();
    session.engine_mut().type_text("!");
    session.on_update(at(start, 20));
    session.on_title_input("Ignored", at(start, 20));
    assert!(session.tick(at(start, 10_000)).is_empty());
    assert_eq!(session.card_store().updates.len(), writes);
    assert_eq!(session.teardown(at(start, 30)), TeardownReport::default());
}

#[test]
fn teardown_without_flush_drops_pending_writes() {
    let start = Instant::now();
    let config = EditorConfig {
        flush_on_teardown: false,
        ..EditorConfig::default()
    };
    let mut session = open_session_with(
        FakeEngine::with_paragraphs(&[""]),
        RecordingCardStore::with_cards(&[]),
        config,
    );
    session.on_ready(start);

    session.engine_mut().type_text("draft");
    session.on_update(start);
    let report = session.teardown(at(start, 10));

    assert!(report.flushed.is_empty());
    assert!(report.cancelled_timers >= 1);
    assert!(session.card_store().updates.is_empty());
    assert_eq!(session.engine().document().plain_text(), "draft");
}
