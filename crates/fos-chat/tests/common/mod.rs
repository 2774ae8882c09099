//! Shared fixtures for fos-chat tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use fos_a11y::{Announcer, AnnouncerConfig, LiveRegionHost, ManualClock, PlatformError, Politeness, RegionHandle};
use fos_chat::{FileUpload, MessageRecord};

/// Live region host that keeps every non-empty write
#[derive(Clone, Default)]
pub struct RecordingHost {
    regions: Rc<RefCell<Vec<Politeness>>>,
    spoken: Rc<RefCell<Vec<(Politeness, String)>>>,
}

impl LiveRegionHost for RecordingHost {
    fn mount(&mut self, politeness: Politeness) -> Result<RegionHandle, PlatformError> {
        let mut regions = self.regions.borrow_mut();
        regions.push(politeness);
        Ok(RegionHandle(regions.len() as u64 - 1))
    }

    fn write(&mut self, region: RegionHandle, text: &str) -> Result<(), PlatformError> {
        if !text.is_empty() {
            let politeness = self.regions.borrow()[region.0 as usize];
            self.spoken.borrow_mut().push((politeness, text.to_string()));
        }
        Ok(())
    }

    fn unmount(&mut self, _: RegionHandle) {}

    fn platform_name(&self) -> &'static str {
        "recording"
    }
}

pub struct Speech {
    pub announcer: Announcer,
    pub clock: ManualClock,
    host: RecordingHost,
}

impl Speech {
    pub fn new() -> Self {
        let clock = ManualClock::new();
        let host = RecordingHost::default();
        let announcer = Announcer::new(AnnouncerConfig::default(), Rc::new(clock.clone()));
        announcer.init(Box::new(host.clone()));
        Self { announcer, clock, host }
    }

    /// Let pending writes land
    pub fn settle(&self) {
        self.clock.advance(10);
        self.announcer.poll();
    }

    pub fn spoken(&self, politeness: Politeness) -> Vec<String> {
        self.host
            .spoken
            .borrow()
            .iter()
            .filter(|(p, _)| *p == politeness)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

pub fn message(id: &str, author: &str, text: &str, at: u64) -> MessageRecord {
    MessageRecord {
        id: id.into(),
        author_id: author.into(),
        author_name: Some(author.to_uppercase()),
        text: text.into(),
        attachments: Vec::new(),
        created_at_ms: at,
    }
}

pub fn file(name: &str, mime: &str, size: u64) -> FileUpload {
    FileUpload { name: name.into(), mime_type: mime.into(), size, bytes: Vec::new() }
}
