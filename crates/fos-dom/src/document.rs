//! Document - High-level document API
//!
//! Owns the tree plus the two pieces of browser state the accessibility
//! layer touches: the active element and `scrollIntoView` requests.

use crate::{focusable, DomError, DomTree, Node, NodeId};

/// Vertical alignment for `scrollIntoView`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBlock {
    Start,
    End,
    #[default]
    Nearest,
}

/// A recorded `scrollIntoView` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub target: NodeId,
    pub block: ScrollBlock,
}

/// Headless HTML document
#[derive(Debug)]
pub struct Document {
    tree: DomTree,
    html_element: NodeId,
    body_element: NodeId,
    active: Option<NodeId>,
    scrolls: Vec<ScrollRequest>,
}

impl Document {
    /// Create `<html><head/><body/></html>`
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");
        // Fresh nodes under the root cannot violate the hierarchy
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            html_element: html,
            body_element: body,
            active: None,
            scrolls: Vec::new(),
        }
    }

    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    pub fn body(&self) -> NodeId {
        self.body_element
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.tree.append_child(parent, child)
    }

    /// Create an element and append it in one step
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let id = self.tree.create_element(tag);
        self.tree.append_child(parent, id)?;
        Ok(id)
    }

    /// Detach a node from the document. Focus inside it falls back to nothing.
    pub fn remove(&mut self, id: NodeId) {
        self.tree.detach(id);
        if let Some(active) = self.active {
            if self.tree.is_inclusive_ancestor(id, active) {
                tracing::trace!(?active, "focused node removed from document");
                self.active = None;
            }
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut crate::ElementData, DomError> {
        self.tree
            .get_mut(id)
            .ok_or(DomError::NoSuchNode(id))?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        self.element_mut(id)?.remove_attr(name);
        Ok(())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.tree.get(id)?.as_element()?.get_attr(name)
    }

    pub fn text_content(&self, id: NodeId) -> String {
        self.tree.text_content(id)
    }

    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        self.tree.set_text_content(id, text)
    }

    /// Node is reachable from the document root
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.tree.get(id).is_some() && self.tree.is_inclusive_ancestor(NodeId::ROOT, id)
    }

    /// `container.contains(node)`
    pub fn contains(&self, container: NodeId, node: NodeId) -> bool {
        self.tree.is_inclusive_ancestor(container, node)
    }

    /// Connected element that can take focus
    pub fn is_focusable(&self, id: NodeId) -> bool {
        self.is_connected(id)
            && self.tree.get(id).and_then(Node::as_element).is_some_and(focusable::is_focusable)
    }

    /// Tab-order descendants of `container` in document order
    pub fn tabbable_descendants(&self, container: NodeId) -> Vec<NodeId> {
        self.tree
            .descendants(container)
            .filter(|&id| {
                self.tree.get(id).and_then(Node::as_element).is_some_and(focusable::is_tabbable)
            })
            .collect()
    }

    pub fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    /// Move focus. Returns false (and leaves focus alone) for nodes that cannot take it.
    pub fn focus(&mut self, id: NodeId) -> bool {
        if !self.is_focusable(id) {
            tracing::trace!(?id, "focus ignored: node not focusable");
            return false;
        }
        self.active = Some(id);
        true
    }

    pub fn blur(&mut self) {
        self.active = None;
    }

    /// Record a `scrollIntoView` request for a connected node
    pub fn scroll_into_view(&mut self, id: NodeId, block: ScrollBlock) -> bool {
        if !self.is_connected(id) {
            return false;
        }
        self.scrolls.push(ScrollRequest { target: id, block });
        true
    }

    pub fn last_scroll(&self) -> Option<ScrollRequest> {
        self.scrolls.last().copied()
    }

    /// Drain recorded scroll requests
    pub fn take_scroll_requests(&mut self) -> Vec<ScrollRequest> {
        std::mem::take(&mut self.scrolls)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
