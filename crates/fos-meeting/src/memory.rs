//! In-memory video transport
//!
//! Backs the replay driver and the test suites. Each operation can be
//! told to fail.

use std::cell::{Cell, RefCell};

use crate::transport::{CallId, HandlerId, Participant, TransportError, VideoEvent, VideoEventKind, VideoTransport};

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoOp {
    Join,
    Leave,
    Camera,
    Microphone,
    StartCaptions,
    StopCaptions,
}

#[derive(Debug, Default)]
struct State {
    joined: Option<CallId>,
    participants: Vec<Participant>,
    handlers: Vec<(HandlerId, CallId, VideoEventKind)>,
    next_handler: u64,
    failing: Vec<VideoOp>,
    log: Vec<String>,
}

/// Video transport with no media behind it
#[derive(Debug, Default)]
pub struct MemoryVideoTransport {
    state: RefCell<State>,
    camera: Cell<bool>,
    microphone: Cell<bool>,
    transcribing: Cell<bool>,
}

impl MemoryVideoTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` fail until told otherwise
    pub fn fail(&self, op: VideoOp, fail: bool) {
        let mut state = self.state.borrow_mut();
        state.failing.retain(|o| *o != op);
        if fail {
            state.failing.push(op);
        }
    }

    fn check(&self, op: VideoOp) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        state.log.push(format!("{op:?}"));
        if state.failing.contains(&op) {
            return Err(TransportError::Rejected(format!("{op:?} refused")));
        }
        Ok(())
    }

    /// Participants present when the call is joined
    pub fn set_participants(&self, participants: Vec<Participant>) {
        self.state.borrow_mut().participants = participants;
    }

    /// Pretend transcription is already running server-side
    pub fn set_transcribing(&self, on: bool) {
        self.transcribing.set(on);
    }

    /// Apply a server-side event; returns true if someone is subscribed
    pub fn publish(&self, event: &VideoEvent) -> bool {
        let mut state = self.state.borrow_mut();
        match event {
            VideoEvent::ParticipantJoined { participant, .. } | VideoEvent::ParticipantUpdated { participant, .. } => {
                match state.participants.iter_mut().find(|p| p.session_id == participant.session_id) {
                    Some(p) => *p = participant.clone(),
                    None => state.participants.push(participant.clone()),
                }
            }
            VideoEvent::ParticipantLeft { session_id, .. } => state.participants.retain(|p| &p.session_id != session_id),
            VideoEvent::CaptionsStarted { .. } => self.transcribing.set(true),
            VideoEvent::CaptionsStopped { .. } | VideoEvent::CaptionsFailed { .. } | VideoEvent::TranscriptionFailed { .. } => {
                self.transcribing.set(false)
            }
            VideoEvent::Caption { .. } => {}
        }
        let kind = event.kind();
        state.handlers.iter().any(|(_, c, k)| c == event.call() && *k == kind)
    }

    pub fn joined(&self) -> Option<CallId> {
        self.state.borrow().joined.clone()
    }

    pub fn handler_count(&self, call: &CallId) -> usize {
        self.state.borrow().handlers.iter().filter(|(_, c, _)| c == call).count()
    }

    /// Every operation attempted, oldest first
    pub fn log(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }
}

impl VideoTransport for MemoryVideoTransport {
    async fn join(&self, call: &CallId) -> Result<(), TransportError> {
        self.check(VideoOp::Join)?;
        self.state.borrow_mut().joined = Some(call.clone());
        Ok(())
    }

    async fn leave(&self) -> Result<(), TransportError> {
        self.check(VideoOp::Leave)?;
        let mut state = self.state.borrow_mut();
        if state.joined.take().is_none() {
            return Err(TransportError::NotJoined);
        }
        Ok(())
    }

    async fn enable_camera(&self) -> Result<(), TransportError> {
        self.check(VideoOp::Camera)?;
        self.camera.set(true);
        Ok(())
    }

    async fn disable_camera(&self) -> Result<(), TransportError> {
        self.check(VideoOp::Camera)?;
        self.camera.set(false);
        Ok(())
    }

    async fn enable_microphone(&self) -> Result<(), TransportError> {
        self.check(VideoOp::Microphone)?;
        self.microphone.set(true);
        Ok(())
    }

    async fn disable_microphone(&self) -> Result<(), TransportError> {
        self.check(VideoOp::Microphone)?;
        self.microphone.set(false);
        Ok(())
    }

    fn camera_enabled(&self) -> bool {
        self.camera.get()
    }

    fn microphone_enabled(&self) -> bool {
        self.microphone.get()
    }

    async fn start_closed_captions(&self, _language: &str) -> Result<(), TransportError> {
        self.check(VideoOp::StartCaptions)
    }

    async fn stop_closed_captions(&self) -> Result<(), TransportError> {
        self.check(VideoOp::StopCaptions)
    }

    fn is_transcribing(&self) -> bool {
        self.transcribing.get()
    }

    fn participants(&self) -> Vec<Participant> {
        self.state.borrow().participants.clone()
    }

    fn on(&self, call: &CallId, kind: VideoEventKind) -> HandlerId {
        let mut state = self.state.borrow_mut();
        let id = HandlerId(state.next_handler);
        state.next_handler += 1;
        state.handlers.push((id, call.clone(), kind));
        id
    }

    fn off(&self, handler: HandlerId) {
        self.state.borrow_mut().handlers.retain(|(id, _, _)| *id != handler);
    }
}
