//! Shared fixtures for fos-meeting tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use fos_a11y::{Announcer, AnnouncerConfig, LiveRegionHost, ManualClock, PlatformError, Politeness, RegionHandle};
use fos_meeting::{
    CallConfig, CallController, CallId, CaptionConfig, CaptionEvent, CaptionStateMachine, MemoryVideoTransport,
    Participant, VideoEvent,
};

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

pub fn machine(speech: &Speech) -> CaptionStateMachine {
    CaptionStateMachine::new(CaptionConfig::default(), speech.announcer.clone(), Rc::new(speech.clock.clone()))
}

pub fn controller(speech: &Speech) -> (Rc<MemoryVideoTransport>, CallController<MemoryVideoTransport>) {
    let transport = Rc::new(MemoryVideoTransport::new());
    let config = CallConfig { device_enable_delay_ms: 0, ..Default::default() };
    let controller = CallController::new(transport.clone(), speech.announcer.clone(), config, machine(speech));
    (transport, controller)
}

pub fn participant(user: &str, session: &str, name: &str) -> Participant {
    Participant {
        user_id: user.into(),
        session_id: session.into(),
        name: Some(name.into()),
        is_local: false,
    }
}

pub fn caption(call: &CallId, speaker: &str, text: &str, is_final: bool) -> VideoEvent {
    VideoEvent::Caption {
        call: call.clone(),
        caption: CaptionEvent { text: text.into(), speaker_id: Some(speaker.into()), is_final, ..Default::default() },
    }
}
