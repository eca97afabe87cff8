//! Cross-reference resolution.
//!
//! # Responsibility
//! - Map `[[Title]]` surface syntax to stable card ids.
//! - Build reference chips with `exists` computed at insertion time.
//! - Resolve chips that were written before their target existed.
//!
//! # Invariants
//! - `extract_titles` returns unique titles in first-appearance order.
//! - Resolution is exact title match; unmatched titles are dropped.
//! - The outbound link list is always recomputed from the whole document,
//!   never tracked incrementally.

use crate::model::card::{CardId, CardSummary};
use crate::model::document::{Node, NodeKind, ReferenceChip};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("valid reference regex"));

/// Titles referenced as `[[Title]]` in `text`, unique, in order of first use.
pub fn extract_titles(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    REFERENCE_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|title| !title.is_empty())
        .filter(|title| seen.insert(title.clone()))
        .collect()
}

/// Ids of the cards whose title exactly matches each title, in title order.
pub fn resolve_to_ids(titles: &[String], cards: &[CardSummary]) -> Vec<CardId> {
    titles
        .iter()
        .filter_map(|title| find_by_title(cards, title))
        .map(|card| card.id.clone())
        .collect()
}

/// Canonical outbound-link value for the persistence `links` channel.
pub fn outbound_links(document: &Node, cards: &[CardSummary]) -> Vec<CardId> {
    resolve_to_ids(&extract_titles(&document.plain_text()), cards)
}

pub fn find_by_title<'a>(cards: &'a [CardSummary], title: &str) -> Option<&'a CardSummary> {
    cards.iter().find(|card| card.title == title)
}

/// Chip for `title`, resolved against the current card list.
pub fn reference_chip(title: &str, cards: &[CardSummary]) -> ReferenceChip {
    match find_by_title(cards, title) {
        Some(card) => ReferenceChip::resolved(title, card.id.clone()),
        None => ReferenceChip::unresolved(title),
    }
}

/// Rewrites every unresolved chip (`href == title`) whose target can now be
/// found by title or id. `lookup_by_id` covers cards missing from `cards`.
///
/// Returns the number of chips rewritten.
pub fn resolve_pending_chips(
    document: &mut Node,
    cards: &[CardSummary],
    mut lookup_by_id: impl FnMut(&str) -> Option<CardSummary>,
) -> usize {
    let mut rewritten = 0;
    document.walk_mut(&mut |node| {
        if node.kind != NodeKind::WikiLink {
            return;
        }
        let Some(chip) = node.as_reference() else {
            return;
        };
        if !chip.is_unresolved() {
            return;
        }

        let target = cards
            .iter()
            .find(|card| card.title == chip.title || card.id == chip.href)
            .cloned()
            .or_else(|| lookup_by_id(&chip.href));
        if let Some(card) = target {
            node.set_attr("href", card.id);
            node.set_attr("exists", true);
            rewritten += 1;
        }
    });
    rewritten
}
