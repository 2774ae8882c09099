//! Keyboard Navigation
//!
//! Roving selection over an externally rendered, ordered list of items:
//! the message list, the call control toolbar. The controller owns only
//! the selected index; the caller passes the current items on every call
//! because the list can change between keystrokes.

use fos_dom::{Document, NodeId, ScrollBlock};

use crate::announce::{Announcer, Politeness};
use crate::focus;

/// Keyboard shortcut
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyboardShortcut {
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl KeyboardShortcut {
    pub fn new(key: &str) -> Self { Self { key: key.into(), ctrl: false, alt: false, shift: false, meta: false } }
    pub fn ctrl(mut self) -> Self { self.ctrl = true; self }
    pub fn alt(mut self) -> Self { self.alt = true; self }
    pub fn shift(mut self) -> Self { self.shift = true; self }

    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl { parts.push("Ctrl"); }
        if self.alt { parts.push("Alt"); }
        if self.shift { parts.push("Shift"); }
        if self.meta { parts.push("Cmd"); }
        parts.push(&self.key);
        parts.join("+")
    }

    fn has_command_modifier(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// Layout of the navigated items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Lists: ArrowUp / ArrowDown
    #[default]
    Vertical,
    /// Toolbars: ArrowLeft / ArrowRight
    Horizontal,
}

/// Navigation action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Next,
    Previous,
    First,
    Last,
    Activate,
}

impl NavAction {
    /// Map a key to an action for the given orientation
    pub fn from_key(key: &KeyboardShortcut, orientation: Orientation) -> Option<Self> {
        if key.has_command_modifier() {
            return None;
        }
        match (key.key.as_str(), orientation) {
            ("ArrowDown", Orientation::Vertical) | ("ArrowRight", Orientation::Horizontal) => Some(Self::Next),
            ("ArrowUp", Orientation::Vertical) | ("ArrowLeft", Orientation::Horizontal) => Some(Self::Previous),
            ("Home", _) => Some(Self::First),
            ("End", _) => Some(Self::Last),
            ("Enter", _) | (" ", _) => Some(Self::Activate),
            _ => None,
        }
    }
}

/// Items currently rendered, with their announcement labels
#[derive(Debug, Clone, Copy)]
pub struct NavItems<'a> {
    pub nodes: &'a [NodeId],
    pub labels: &'a [String],
}

impl<'a> NavItems<'a> {
    pub fn new(nodes: &'a [NodeId], labels: &'a [String]) -> Self {
        Self { nodes, labels }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Roving selection controller
///
/// `selected` is always in `-1..=len-1`; `-1` means nothing is selected.
/// Moves clamp at both ends instead of wrapping, except that from the
/// unselected state `Next` lands on the first item and `Previous` on the
/// last.
#[derive(Debug)]
pub struct KeyboardNavigationController {
    selected: isize,
    orientation: Orientation,
    announcer: Announcer,
}

impl KeyboardNavigationController {
    pub fn new(orientation: Orientation, announcer: Announcer) -> Self {
        Self { selected: -1, orientation, announcer }
    }

    pub fn selected_index(&self) -> isize {
        self.selected
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Forget the selection (e.g. the list was replaced)
    pub fn reset(&mut self) {
        self.selected = -1;
    }

    /// Pull a stale index back inside a list that shrank
    fn clamp(&mut self, len: usize) {
        let max = len as isize - 1;
        if self.selected > max {
            tracing::trace!(from = self.selected, to = max, "selection clamped after list shrank");
            self.selected = max;
        }
    }

    fn land(&mut self, doc: &mut Document, items: &NavItems<'_>, index: isize, block: ScrollBlock) -> Option<usize> {
        self.selected = index;
        let i = usize::try_from(index).ok()?;
        focus::reveal(doc, items.nodes[i], block);
        Some(i)
    }

    pub fn move_next(&mut self, doc: &mut Document, items: &NavItems<'_>) -> Option<usize> {
        self.clamp(items.len());
        if items.is_empty() {
            return None;
        }
        let last = items.len() as isize - 1;
        let target = if self.selected < 0 { 0 } else { (self.selected + 1).min(last) };
        self.land(doc, items, target, ScrollBlock::Nearest)
    }

    pub fn move_previous(&mut self, doc: &mut Document, items: &NavItems<'_>) -> Option<usize> {
        self.clamp(items.len());
        if items.is_empty() {
            return None;
        }
        let last = items.len() as isize - 1;
        let target = if self.selected < 0 { last } else { (self.selected - 1).max(0) };
        self.land(doc, items, target, ScrollBlock::Nearest)
    }

    pub fn move_to_start(&mut self, doc: &mut Document, items: &NavItems<'_>) -> Option<usize> {
        self.clamp(items.len());
        if items.is_empty() {
            return None;
        }
        self.land(doc, items, 0, ScrollBlock::Start)
    }

    pub fn move_to_end(&mut self, doc: &mut Document, items: &NavItems<'_>) -> Option<usize> {
        self.clamp(items.len());
        if items.is_empty() {
            return None;
        }
        let last = items.len() as isize - 1;
        self.land(doc, items, last, ScrollBlock::End)
    }

    /// Select an item directly (pointer click). Out-of-range indices are ignored.
    pub fn select(&mut self, doc: &mut Document, items: &NavItems<'_>, index: usize) -> Option<usize> {
        self.clamp(items.len());
        if index >= items.len() {
            return None;
        }
        self.land(doc, items, index as isize, ScrollBlock::Nearest)
    }

    /// Confirm the current selection to assistive technology
    pub fn activate(&mut self, items: &NavItems<'_>) -> Option<usize> {
        self.clamp(items.len());
        let i = usize::try_from(self.selected).ok()?;
        let message = match items.labels.get(i) {
            Some(label) => format!("Selected {label}"),
            None => format!("Selected item {} of {}", i + 1, items.len()),
        };
        self.announcer.announce(&message, Politeness::Polite);
        Some(i)
    }

    /// Handle a keydown on the list container. Returns true if consumed.
    pub fn handle_key(&mut self, doc: &mut Document, items: &NavItems<'_>, key: &KeyboardShortcut) -> bool {
        let Some(action) = NavAction::from_key(key, self.orientation) else { return false };
        match action {
            NavAction::Next => { self.move_next(doc, items); }
            NavAction::Previous => { self.move_previous(doc, items); }
            NavAction::First => { self.move_to_start(doc, items); }
            NavAction::Last => { self.move_to_end(doc, items); }
            NavAction::Activate => { self.activate(items); }
        }
        true
    }
}
