//! Trigger menu state machine.
//!
//! # Responsibility
//! - Hold the single menu state: idle, reference menu or command menu.
//! - Filter menu items for the current query and own keyboard navigation
//!   while a menu is open.
//! - Turn a selection into a `Commit` the session applies to the document.
//!
//! # Invariants
//! - Both menus are never open together; opening one replaces the other.
//! - Keys are only consumed while a menu is open.
//! - Closing a menu never mutates the document.
//! - A trigger dismissed with Escape stays closed until its span or query
//!   changes.

use crate::editor::anchor::MenuAnchor;
use crate::editor::trigger::{Trigger, TriggerKind};
use crate::engine::{BlockCommand, TextRange};
use crate::model::card::CardSummary;

/// What a command menu entry does once chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Block(BlockCommand),
    /// Inserts `[[` so the reference menu opens at the caret.
    OpenReference,
}

/// One static command menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandItem {
    pub id: &'static str,
    pub label: &'static str,
    keywords: &'static [&'static str],
    pub action: CommandAction,
}

impl CommandItem {
    fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.label.to_lowercase().contains(&query)
            || self.id.starts_with(&query)
            || self
                .keywords
                .iter()
                .any(|keyword| keyword.starts_with(&query))
    }
}

pub const COMMAND_ITEMS: &[CommandItem] = &[
    CommandItem {
        id: "heading1",
        label: "Heading 1",
        keywords: &["heading", "h1", "title", "标题"],
        action: CommandAction::Block(BlockCommand::SetHeading(1)),
    },
    CommandItem {
        id: "heading2",
        label: "Heading 2",
        keywords: &["heading", "h2", "subtitle", "标题"],
        action: CommandAction::Block(BlockCommand::SetHeading(2)),
    },
    CommandItem {
        id: "heading3",
        label: "Heading 3",
        keywords: &["heading", "h3", "标题"],
        action: CommandAction::Block(BlockCommand::SetHeading(3)),
    },
    CommandItem {
        id: "paragraph",
        label: "Text",
        keywords: &["paragraph", "text", "p", "正文"],
        action: CommandAction::Block(BlockCommand::SetParagraph),
    },
    CommandItem {
        id: "bulletList",
        label: "Bullet list",
        keywords: &["bullet", "list", "ul", "列表"],
        action: CommandAction::Block(BlockCommand::ToggleBulletList),
    },
    CommandItem {
        id: "orderedList",
        label: "Numbered list",
        keywords: &["numbered", "ordered", "list", "ol", "列表"],
        action: CommandAction::Block(BlockCommand::ToggleOrderedList),
    },
    CommandItem {
        id: "taskList",
        label: "Task list",
        keywords: &["task", "todo", "checkbox", "待办"],
        action: CommandAction::Block(BlockCommand::ToggleTaskList),
    },
    CommandItem {
        id: "blockquote",
        label: "Quote",
        keywords: &["quote", "blockquote", "引用"],
        action: CommandAction::Block(BlockCommand::ToggleBlockquote),
    },
    CommandItem {
        id: "codeBlock",
        label: "Code block",
        keywords: &["code", "codeblock", "代码"],
        action: CommandAction::Block(BlockCommand::ToggleCodeBlock),
    },
    CommandItem {
        id: "table",
        label: "Table",
        keywords: &["table", "grid", "表格"],
        action: CommandAction::Block(BlockCommand::InsertTable {
            rows: 3,
            cols: 3,
            with_header_row: true,
        }),
    },
    CommandItem {
        id: "horizontalRule",
        label: "Divider",
        keywords: &["divider", "hr", "rule", "分割线"],
        action: CommandAction::Block(BlockCommand::InsertHorizontalRule),
    },
    CommandItem {
        id: "reference",
        label: "Link to card",
        keywords: &["link", "wiki", "reference", "card", "链接"],
        action: CommandAction::OpenReference,
    },
];

/// Command entries matching `query`, in menu order.
pub fn command_items(query: &str) -> Vec<CommandItem> {
    COMMAND_ITEMS
        .iter()
        .filter(|item| item.matches(query))
        .copied()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Card(CardSummary),
    /// Create a card with this title, then reference it.
    CreateCard { title: String },
    Command(CommandItem),
}

/// Reference entries for `query`: exact, then prefix, then substring matches
/// (case-insensitive), capped at `limit`, plus a create entry when no card
/// carries exactly the trimmed query as its title.
pub fn reference_items(query: &str, cards: &[CardSummary], limit: usize) -> Vec<MenuItem> {
    let trimmed = query.trim();
    let needle = trimmed.to_lowercase();

    let mut ranked: Vec<(u8, usize, &CardSummary)> = cards
        .iter()
        .enumerate()
        .filter_map(|(index, card)| {
            let title = card.title.to_lowercase();
            let rank = if needle.is_empty() || title.contains(&needle) {
                if title == needle {
                    0
                } else if title.starts_with(&needle) {
                    1
                } else {
                    2
                }
            } else {
                return None;
            };
            Some((rank, index, card))
        })
        .collect();
    ranked.sort_by_key(|(rank, index, _)| (*rank, *index));

    let mut items: Vec<MenuItem> = ranked
        .into_iter()
        .take(limit)
        .map(|(_, _, card)| MenuItem::Card(card.clone()))
        .collect();

    let exact_exists = cards.iter().any(|card| card.title == trimmed);
    if !trimmed.is_empty() && !exact_exists {
        items.push(MenuItem::CreateCard {
            title: trimmed.to_string(),
        });
    }
    items
}

/// An open menu and its current contents.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMenu {
    pub trigger: Trigger,
    pub items: Vec<MenuItem>,
    pub highlighted: usize,
    pub anchor: Option<MenuAnchor>,
}

impl OpenMenu {
    pub fn highlighted_item(&self) -> Option<&MenuItem> {
        self.items.get(self.highlighted)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum MenuState {
    #[default]
    Idle,
    ReferenceMenuOpen(OpenMenu),
    CommandMenuOpen(OpenMenu),
}

impl MenuState {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    pub fn kind(&self) -> Option<TriggerKind> {
        match self {
            Self::Idle => None,
            Self::ReferenceMenuOpen(_) => Some(TriggerKind::Reference),
            Self::CommandMenuOpen(_) => Some(TriggerKind::Command),
        }
    }

    pub fn menu(&self) -> Option<&OpenMenu> {
        match self {
            Self::Idle => None,
            Self::ReferenceMenuOpen(menu) | Self::CommandMenuOpen(menu) => Some(menu),
        }
    }

    fn menu_mut(&mut self) -> Option<&mut OpenMenu> {
        match self {
            Self::Idle => None,
            Self::ReferenceMenuOpen(menu) | Self::CommandMenuOpen(menu) => Some(menu),
        }
    }

    pub fn trigger_range(&self) -> Option<TextRange> {
        self.menu().map(|menu| menu.trigger.range)
    }
}

/// Result of feeding one detection into the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTransition {
    StayedIdle,
    Opened(TriggerKind),
    Updated(TriggerKind),
    /// The other menu was forced closed.
    Switched { from: TriggerKind, to: TriggerKind },
    Closed(TriggerKind),
}

/// Keys a menu can consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKey {
    Up,
    Down,
    Enter,
    Tab,
    Escape,
}

/// A chosen item together with the trigger span it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub kind: TriggerKind,
    pub range: TextRange,
    pub item: MenuItem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// No menu open, or the key is not a menu key; the engine handles it.
    NotHandled,
    Moved,
    Closed,
    Commit(Commit),
}

/// Owns the menu state and the keys routed to it.
#[derive(Debug)]
pub struct MenuCoordinator {
    state: MenuState,
    reference_limit: usize,
    /// Trigger the user closed with Escape.
    dismissed: Option<Trigger>,
}

impl MenuCoordinator {
    pub fn new(reference_limit: usize) -> Self {
        Self {
            state: MenuState::Idle,
            reference_limit,
            dismissed: None,
        }
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    /// Applies one detection result computed after a mutation or caret move.
    pub fn observe(
        &mut self,
        detection: Option<Trigger>,
        cards: &[CardSummary],
        anchor: Option<MenuAnchor>,
    ) -> MenuTransition {
        let previous = self.state.kind();
        if detection.is_some() && detection == self.dismissed {
            return MenuTransition::StayedIdle;
        }
        self.dismissed = None;
        let Some(trigger) = detection else {
            self.state = MenuState::Idle;
            return match previous {
                Some(kind) => MenuTransition::Closed(kind),
                None => MenuTransition::StayedIdle,
            };
        };

        let kind = trigger.kind;
        let items = match kind {
            TriggerKind::Reference => reference_items(&trigger.query, cards, self.reference_limit),
            TriggerKind::Command => command_items(&trigger.query)
                .into_iter()
                .map(MenuItem::Command)
                .collect(),
        };

        let highlighted = match self.state.menu() {
            Some(menu) if previous == Some(kind) && menu.trigger.query == trigger.query => {
                menu.highlighted.min(items.len().saturating_sub(1))
            }
            _ => 0,
        };

        let menu = OpenMenu {
            trigger,
            items,
            highlighted,
            anchor,
        };
        self.state = match kind {
            TriggerKind::Reference => MenuState::ReferenceMenuOpen(menu),
            TriggerKind::Command => MenuState::CommandMenuOpen(menu),
        };

        match previous {
            None => MenuTransition::Opened(kind),
            Some(old) if old == kind => MenuTransition::Updated(kind),
            Some(old) => MenuTransition::Switched { from: old, to: kind },
        }
    }

    /// Keyboard handling scoped to the open menu.
    pub fn handle_key(&mut self, key: MenuKey) -> KeyOutcome {
        let Some(menu) = self.state.menu_mut() else {
            return KeyOutcome::NotHandled;
        };

        match key {
            MenuKey::Up | MenuKey::Down => {
                let count = menu.items.len();
                if count == 0 {
                    return KeyOutcome::Moved;
                }
                menu.highlighted = if key == MenuKey::Up {
                    (menu.highlighted + count - 1) % count
                } else {
                    (menu.highlighted + 1) % count
                };
                KeyOutcome::Moved
            }
            MenuKey::Enter | MenuKey::Tab => {
                if menu.items.is_empty() {
                    self.state = MenuState::Idle;
                    return KeyOutcome::NotHandled;
                }
                let index = menu.highlighted;
                match self.select(index) {
                    Some(commit) => KeyOutcome::Commit(commit),
                    None => KeyOutcome::NotHandled,
                }
            }
            MenuKey::Escape => {
                self.dismissed = Some(menu.trigger.clone());
                self.state = MenuState::Idle;
                KeyOutcome::Closed
            }
        }
    }

    /// Chooses item `index` (keyboard or pointer) and closes the menu.
    pub fn select(&mut self, index: usize) -> Option<Commit> {
        let kind = self.state.kind()?;
        let menu = self.state.menu()?;
        let item = menu.items.get(index)?.clone();
        let range = menu.trigger.range;
        self.state = MenuState::Idle;
        Some(Commit { kind, range, item })
    }

    /// Closes any open menu; returns whether one was open.
    pub fn close(&mut self) -> bool {
        let was_open = self.state.is_open();
        self.state = MenuState::Idle;
        was_open
    }
}
