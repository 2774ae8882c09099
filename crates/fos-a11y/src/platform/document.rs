//! Headless document host
//!
//! Renders live regions as visually hidden `<div aria-live>` children of
//! `<body>`, the same markup a browser overlay injects.

use std::cell::RefCell;
use std::rc::Rc;

use fos_dom::{Document, NodeId};

use super::{LiveRegionHost, PlatformError, RegionHandle};
use crate::announce::Politeness;

const OFFSCREEN_STYLE: &str =
    "position:absolute;left:-10000px;width:1px;height:1px;overflow:hidden";

/// Live region host backed by a shared [`Document`]
///
/// The document is borrowed only for the duration of each call. If the
/// caller already holds it mutably the host reports [`PlatformError::Busy`]
/// and the announcer retries on its next poll.
#[derive(Debug)]
pub struct DocumentHost {
    doc: Rc<RefCell<Document>>,
    regions: Vec<Option<NodeId>>,
}

impl DocumentHost {
    pub fn new(doc: Rc<RefCell<Document>>) -> Self {
        Self { doc, regions: Vec::new() }
    }

    /// Node rendering a region, for inspection
    pub fn region_node(&self, region: RegionHandle) -> Option<NodeId> {
        self.regions.get(region.0 as usize).copied().flatten()
    }
}

impl LiveRegionHost for DocumentHost {
    fn mount(&mut self, politeness: Politeness) -> Result<RegionHandle, PlatformError> {
        let mut doc = self.doc.try_borrow_mut().map_err(|_| PlatformError::Busy)?;
        let body = doc.body();
        let node = doc
            .append_element(body, "div")
            .map_err(|e| PlatformError::Unavailable(e.to_string()))?;

        let attrs = [
            ("aria-live", politeness.as_str()),
            ("aria-atomic", "true"),
            ("class", "sr-only"),
            ("style", OFFSCREEN_STYLE),
        ];
        for (name, value) in attrs {
            doc.set_attribute(node, name, value)
                .map_err(|e| PlatformError::Unavailable(e.to_string()))?;
        }

        self.regions.push(Some(node));
        Ok(RegionHandle(self.regions.len() as u64 - 1))
    }

    fn write(&mut self, region: RegionHandle, text: &str) -> Result<(), PlatformError> {
        let node = self.region_node(region).ok_or(PlatformError::Detached)?;
        let mut doc = self.doc.try_borrow_mut().map_err(|_| PlatformError::Busy)?;
        if !doc.is_connected(node) {
            return Err(PlatformError::Detached);
        }
        doc.set_text_content(node, text)
            .map_err(|e| PlatformError::Unavailable(e.to_string()))
    }

    fn unmount(&mut self, region: RegionHandle) {
        let Some(slot) = self.regions.get_mut(region.0 as usize) else { return };
        let Some(node) = slot.take() else { return };
        match self.doc.try_borrow_mut() {
            Ok(mut doc) => doc.remove(node),
            Err(_) => tracing::warn!(?node, "document busy; live region left mounted"),
        }
    }

    fn platform_name(&self) -> &'static str {
        "headless-document"
    }
}
