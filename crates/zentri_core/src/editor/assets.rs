//! Image asset usage tracking.
//!
//! # Responsibility
//! - Extract vault-relative asset paths from `image` nodes.
//! - Keep the set referenced at load time and the set referenced now, so
//!   teardown can delete images the user removed.
//!
//! # Invariants
//! - Only paths under the vault `attachments/` tree are tracked; remote and
//!   inline (`data:`) images are ignored.
//! - Images added during the session are never reported as orphans.

use crate::debounce::{DebounceScheduler, TimerKey};
use crate::model::document::{Node, NodeKind};
use percent_encoding::percent_decode_str;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use url::Url;

const ATTACHMENTS_DIR: &str = "attachments/";
const ASSET_HOSTS: &[&str] = &["localhost", "asset.localhost"];

/// Vault-relative path of an image node, from `relativePath` or its `src`.
pub fn image_relative_path(node: &Node) -> Option<String> {
    if node.kind != NodeKind::Image {
        return None;
    }
    if let Some(path) = node.attr_str("relativePath").map(str::trim) {
        if !path.is_empty() {
            return Some(path.replace('\\', "/"));
        }
    }
    node.attr_str("src").and_then(relative_path_from_src)
}

/// Recovers the vault-relative path from the URL forms images are displayed
/// with: bare relative paths, `asset://localhost/…`,
/// `http(s)://asset.localhost/…` and `file://…`.
pub fn relative_path_from_src(src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return None;
    }

    if !src.contains("://") {
        let path = src.replace('\\', "/");
        let path = path.trim_start_matches("./");
        return attachments_suffix(path);
    }

    let url = Url::parse(src).ok()?;
    let local = match url.scheme() {
        "asset" | "file" => true,
        "http" | "https" => url
            .host_str()
            .is_some_and(|host| ASSET_HOSTS.contains(&host)),
        _ => false,
    };
    if !local {
        return None;
    }

    let decoded = percent_decode_str(url.path()).decode_utf8().ok()?;
    attachments_suffix(&decoded.replace('\\', "/"))
}

fn attachments_suffix(path: &str) -> Option<String> {
    if path.starts_with(ATTACHMENTS_DIR) {
        return Some(path.to_string());
    }
    let marker = format!("/{ATTACHMENTS_DIR}");
    path.rfind(&marker)
        .map(|index| path[index + 1..].to_string())
}

/// Every tracked asset path referenced by `document`.
pub fn collect_image_paths(document: &Node) -> BTreeSet<String> {
    let mut paths = BTreeSet::new();
    document.walk(&mut |node| {
        if let Some(path) = image_relative_path(node) {
            paths.insert(path);
        }
    });
    paths
}

#[derive(Debug, Default)]
pub struct ImageUsageTracker {
    initial: Option<BTreeSet<String>>,
    current: BTreeSet<String>,
}

impl ImageUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the load-time set. Later calls are ignored.
    pub fn load(&mut self, document: &Node) {
        if self.initial.is_some() {
            return;
        }
        let paths = collect_image_paths(document);
        self.current = paths.clone();
        self.initial = Some(paths);
    }

    pub fn schedule_rescan(
        &self,
        scheduler: &mut DebounceScheduler<TimerKey>,
        now: Instant,
        delay: Duration,
    ) {
        scheduler.schedule(TimerKey::ImageScan, now, delay);
    }

    pub fn rescan(&mut self, document: &Node) {
        self.current = collect_image_paths(document);
    }

    pub fn initial(&self) -> Option<&BTreeSet<String>> {
        self.initial.as_ref()
    }

    pub fn current(&self) -> &BTreeSet<String> {
        &self.current
    }

    /// Referenced at load time, no longer referenced now.
    pub fn orphaned(&self) -> Vec<String> {
        match &self.initial {
            Some(initial) => initial.difference(&self.current).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Referenced now but not at load time; these stay untouched.
    pub fn added(&self) -> Vec<String> {
        match &self.initial {
            Some(initial) => self.current.difference(initial).cloned().collect(),
            None => self.current.iter().cloned().collect(),
        }
    }
}
