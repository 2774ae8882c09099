//! Focus Management
//!
//! Single-slot save/restore for modal-like views, and Tab/Shift+Tab
//! trapping inside a container.
//!
//! The manager never owns elements. Saved and trapped nodes are plain
//! [`NodeId`]s checked against the document on every use, so a node that
//! has been removed is simply skipped.

use fos_dom::{Document, NodeId, ScrollBlock};

use crate::keyboard_nav::KeyboardShortcut;

/// Trap identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrapId(u64);

/// Back-references recorded when a trap begins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusFrame {
    pub id: TrapId,
    /// Element focused before the trap took over
    pub previous: Option<NodeId>,
    pub container: NodeId,
}

/// Release handle returned by [`FocusManager::trap_focus`]
#[must_use = "a focus trap stays active until released"]
#[derive(Debug, PartialEq, Eq)]
pub struct FocusTrap {
    id: TrapId,
}

impl FocusTrap {
    pub fn id(&self) -> TrapId {
        self.id
    }
}

/// Focus manager
#[derive(Debug, Default)]
pub struct FocusManager {
    saved: Option<NodeId>,
    frames: Vec<FocusFrame>,
    next_trap: u64,
}

/// Focus `node` and request it be scrolled into view, as one step.
/// Disconnected nodes get neither.
pub(crate) fn reveal(doc: &mut Document, node: NodeId, block: ScrollBlock) -> bool {
    if !doc.is_connected(node) {
        return false;
    }
    let focused = doc.focus(node);
    doc.scroll_into_view(node, block);
    focused
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the focused element, overwriting any earlier save
    pub fn save_focus(&mut self, doc: &Document) {
        self.saved = doc.active_element();
        tracing::trace!(saved = ?self.saved, "focus saved");
    }

    pub fn saved(&self) -> Option<NodeId> {
        self.saved
    }

    /// Refocus the saved element if it is still in the document and focusable
    pub fn restore_focus(&mut self, doc: &mut Document) -> bool {
        match self.saved {
            Some(node) if doc.is_focusable(node) => doc.focus(node),
            Some(node) => {
                tracing::debug!(?node, "saved focus target gone; not restoring");
                false
            }
            None => false,
        }
    }

    /// Focus `node` if there is one and it can take focus
    pub fn manage_focus(&self, doc: &mut Document, node: Option<NodeId>) -> bool {
        node.is_some_and(|n| doc.focus(n))
    }

    /// Confine Tab cycling to `container` and focus its first tabbable descendant
    pub fn trap_focus(&mut self, doc: &mut Document, container: NodeId) -> FocusTrap {
        let id = TrapId(self.next_trap);
        self.next_trap += 1;

        if !doc.is_connected(container) {
            tracing::debug!(?container, "focus trap requested on detached container");
            return FocusTrap { id };
        }

        self.frames.push(FocusFrame {
            id,
            previous: doc.active_element(),
            container,
        });

        if let Some(&first) = doc.tabbable_descendants(container).first() {
            doc.focus(first);
        }
        FocusTrap { id }
    }

    /// Remove a trap. Returns false if it was already gone.
    pub fn release(&mut self, trap: FocusTrap) -> bool {
        let before = self.frames.len();
        self.frames.retain(|f| f.id != trap.id);
        self.frames.len() != before
    }

    /// Innermost active trap
    pub fn active_trap(&self) -> Option<&FocusFrame> {
        self.frames.last()
    }

    /// Route a keydown through the innermost trap.
    ///
    /// Returns true when the key was consumed (default action prevented).
    pub fn handle_key_down(&mut self, doc: &mut Document, key: &KeyboardShortcut) -> bool {
        if key.key != "Tab" || key.ctrl || key.alt || key.meta {
            return false;
        }

        // Drop traps whose container was removed
        while let Some(frame) = self.frames.last() {
            if doc.is_connected(frame.container) {
                break;
            }
            tracing::debug!(container = ?frame.container, "focus trap container removed");
            self.frames.pop();
        }
        let Some(frame) = self.frames.last() else { return false };

        let items = doc.tabbable_descendants(frame.container);
        let Some(last) = items.len().checked_sub(1) else { return true };
        let current = doc.active_element().and_then(|a| items.iter().position(|&n| n == a));

        let next = match (key.shift, current) {
            (true, Some(0) | None) => last,
            (true, Some(i)) => i - 1,
            (false, Some(i)) if i < last => i + 1,
            (false, _) => 0,
        };
        doc.focus(items[next]);
        true
    }
}
