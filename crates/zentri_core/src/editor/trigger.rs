//! Trigger detection over the text before the caret.
//!
//! # Responsibility
//! - Decide whether a `[[` reference trigger or a `/` command trigger is
//!   open at the caret, as a pure function of (text, caret position).
//! - Detect a just-completed `[[Title]]` so it can become a chip.
//!
//! # Invariants
//! - At most one trigger is reported; a reference trigger takes precedence.
//! - Reported ranges always end at the caret position.

use crate::engine::{CaretContext, TextRange};
use once_cell::sync::Lazy;
use regex::Regex;

static REFERENCE_TRIGGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]]*)?$").expect("valid reference trigger regex"));
static COMMAND_TRIGGER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/([\w\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]*)$")
        .expect("valid command trigger regex")
});
static COMPLETED_REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]]+)\]\]$").expect("valid completed reference regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    /// `[[query`
    Reference,
    /// `/query`
    Command,
}

/// An open, unterminated trigger sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub kind: TriggerKind,
    /// Span of the trigger including its `[[` or `/` prefix.
    pub range: TextRange,
    pub query: String,
}

/// A `[[Title]]` span that was closed right before the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedReference {
    pub range: TextRange,
    pub title: String,
}

/// Detects the trigger open at the caret, if any.
pub fn detect_trigger(context: &CaretContext) -> Option<Trigger> {
    detect_in(&context.text_before, context.position)
}

/// Pure form of `detect_trigger` over a text slice ending at `caret`.
pub fn detect_in(text_before: &str, caret: usize) -> Option<Trigger> {
    if let Some(caps) = REFERENCE_TRIGGER_RE.captures(text_before) {
        let whole = caps.get(0)?;
        let query = caps.get(1).map_or("", |m| m.as_str());
        return Some(Trigger {
            kind: TriggerKind::Reference,
            range: range_ending_at(text_before, whole.start(), caret)?,
            query: query.to_string(),
        });
    }

    let caps = COMMAND_TRIGGER_RE.captures(text_before)?;
    let whole = caps.get(0)?;
    Some(Trigger {
        kind: TriggerKind::Command,
        range: range_ending_at(text_before, whole.start(), caret)?,
        query: caps.get(1).map_or("", |m| m.as_str()).to_string(),
    })
}

/// Detects `[[Title]]` typed right before the caret.
pub fn detect_completed_reference(context: &CaretContext) -> Option<CompletedReference> {
    let caps = COMPLETED_REFERENCE_RE.captures(&context.text_before)?;
    let whole = caps.get(0)?;
    let title = caps.get(1)?.as_str().trim();
    if title.is_empty() {
        return None;
    }
    Some(CompletedReference {
        range: range_ending_at(&context.text_before, whole.start(), context.position)?,
        title: title.to_string(),
    })
}

/// Converts a byte offset inside `text` into a position range ending at `caret`.
fn range_ending_at(text: &str, match_start: usize, caret: usize) -> Option<TextRange> {
    let span_chars = text.get(match_start..)?.chars().count();
    let from = caret.checked_sub(span_chars)?;
    Some(TextRange::new(from, caret))
}

#[cfg(test)]
mod tests {
    use super::{detect_completed_reference, detect_in, TriggerKind};
    use crate::engine::{CaretContext, TextRange};

    #[test]
    fn reference_trigger_reports_query_and_range() {
        let trigger = detect_in("see [[Exist", 12).expect("trigger");
        assert_eq!(trigger.kind, TriggerKind::Reference);
        assert_eq!(trigger.query, "Exist");
        assert_eq!(trigger.range, TextRange::new(5, 12));
    }

    #[test]
    fn bare_brackets_open_reference_with_empty_query() {
        let trigger = detect_in("[[", 3).expect("trigger");
        assert_eq!(trigger.kind, TriggerKind::Reference);
        assert_eq!(trigger.query, "");
        assert_eq!(trigger.range, TextRange::new(1, 3));
    }

    #[test]
    fn reference_wins_over_command_inside_query() {
        let trigger = detect_in("[[a/b", 6).expect("trigger");
        assert_eq!(trigger.kind, TriggerKind::Reference);
        assert_eq!(trigger.query, "a/b");
    }

    #[test]
    fn every_partial_without_closing_bracket_opens_reference_menu() {
        for partial in ["", "x", "two words", "标题", "a/b", "emoji 🚀", "[nested"] {
            let text = format!("lead [[{partial}");
            let caret = 1 + text.chars().count();
            let trigger = detect_in(&text, caret).expect("trigger for partial");
            assert_eq!(trigger.kind, TriggerKind::Reference, "partial {partial:?}");
        }
    }

    #[test]
    fn closed_reference_is_not_a_trigger() {
        assert!(detect_in("[[done]]", 9).is_none());
        assert!(detect_in("[[done]", 8).is_none());
    }

    #[test]
    fn command_trigger_accepts_cjk_queries() {
        let trigger = detect_in("/head", 6).expect("trigger");
        assert_eq!(trigger.kind, TriggerKind::Command);
        assert_eq!(trigger.query, "head");
        assert_eq!(trigger.range, TextRange::new(1, 6));

        let trigger = detect_in("文字/标题", 6).expect("cjk trigger");
        assert_eq!(trigger.query, "标题");
        assert_eq!(trigger.range, TextRange::new(3, 6));
    }

    #[test]
    fn command_trigger_closes_on_space() {
        assert!(detect_in("/head ", 7).is_none());
        assert!(detect_in("plain text", 11).is_none());
    }

    #[test]
    fn completed_reference_spans_the_brackets() {
        let context = CaretContext {
            position: 20,
            text_before: "go [[Existing Note]]".to_string(),
        };
        let completed = detect_completed_reference(&context).expect("completed");
        assert_eq!(completed.title, "Existing Note");
        assert_eq!(completed.range, TextRange::new(3, 20));

        let blank = CaretContext {
            position: 6,
            text_before: "[[  ]]".to_string(),
        };
        assert!(detect_completed_reference(&blank).is_none());
    }
}
