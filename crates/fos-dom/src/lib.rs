//! fOS DOM - Headless Document
//!
//! Arena-backed element tree that stands in for the browser DOM.
//! Tracks the focused element and scroll requests so the accessibility
//! layer can be driven and inspected without layout or rendering.

mod node;
mod tree;
mod document;
mod focusable;

pub use node::{Node, NodeData, ElementData};
pub use tree::{DomTree, Descendants};
pub use document::{Document, ScrollBlock, ScrollRequest};
pub use focusable::{is_focusable, is_tabbable, TABBABLE_SELECTOR};

/// Node identifier (index into arena)
///
/// Ids are never reused, so a stale id held after removal can be
/// checked with [`Document::is_connected`] instead of dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Document root
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node" links inside the arena
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// DOM error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("No such node: {0:?}")]
    NoSuchNode(NodeId),

    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("Cannot insert {child:?} into its own subtree at {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}
