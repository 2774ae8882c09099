//! Caption State Machine
//!
//! Live caption status and the bounded transcript buffer.
//!
//! The machine performs no I/O. `request_start` and `request_stop` return a
//! [`CaptionCommand`] for the caller to run against the transport, and the
//! caller reports the outcome through [`CaptionStateMachine::complete`].
//! Every request carries a fresh [`IntentToken`]; results and lifecycle
//! events that contradict the latest intent are discarded, so a slow
//! `captions_started` acknowledgment cannot revive captions the user has
//! already turned off.

use std::fmt;
use std::rc::Rc;

use fos_a11y::{Announcer, Clock, Politeness};
use serde::Deserialize;

use crate::roster::Roster;
use crate::transport::{CaptionEvent, TransportError, VideoEvent};

/// Caption status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptionStatus {
    #[default]
    Idle,
    Starting,
    Active,
    Error,
}

impl CaptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Active => "active",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CaptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub session_key: String,
    pub text: String,
    pub speaker_id: Option<String>,
    pub speaker_name: String,
    pub timestamp_ms: u64,
    pub is_final: bool,
}

/// Caption configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Transcript entries kept
    pub capacity: usize,
    /// Language requested from the speech pipeline
    pub language: String,
    /// Time in error before returning to the previous status
    pub error_reset_ms: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            language: "en".to_string(),
            error_reset_ms: 3000,
        }
    }
}

/// Identifies one toggle request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntentToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntentKind {
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy)]
struct Intent {
    token: IntentToken,
    kind: IntentKind,
    /// Status to return to after a transport rejection
    restore: CaptionStatus,
}

/// Transport operation requested by the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionCommand {
    Start { token: IntentToken, language: String },
    Stop { token: IntentToken },
}

impl CaptionCommand {
    pub fn token(&self) -> IntentToken {
        match self {
            Self::Start { token, .. } | Self::Stop { token } => *token,
        }
    }
}

/// Live caption state and transcript
#[derive(Debug)]
pub struct CaptionStateMachine {
    config: CaptionConfig,
    announcer: Announcer,
    clock: Rc<dyn Clock>,
    status: CaptionStatus,
    supported: bool,
    transcript: Vec<TranscriptEntry>,
    roster: Roster,
    intent: Option<Intent>,
    next_token: u64,
    /// Pending automatic exit from `Error`: (deadline, status to restore)
    reset_at: Option<(u64, CaptionStatus)>,
}

impl CaptionStateMachine {
    pub fn new(config: CaptionConfig, announcer: Announcer, clock: Rc<dyn Clock>) -> Self {
        Self {
            config,
            announcer,
            clock,
            status: CaptionStatus::Idle,
            supported: true,
            transcript: Vec::new(),
            roster: Roster::new(),
            intent: None,
            next_token: 0,
            reset_at: None,
        }
    }

    pub fn status(&self) -> CaptionStatus {
        self.status
    }

    /// False once the transport reported captions unavailable this session
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    pub fn config(&self) -> &CaptionConfig {
        &self.config
    }

    /// Placeholder text for the caption panel
    pub fn status_message(&self) -> &'static str {
        match self.status {
            CaptionStatus::Starting => "Starting live captions...",
            CaptionStatus::Active => "Listening for speech...",
            CaptionStatus::Error => "Caption error. Try toggling captions off and on again.",
            CaptionStatus::Idle => "Click the captions button to enable live closed captions.",
        }
    }

    fn say(&self, text: &str, priority: Politeness) {
        self.announcer.announce(text, priority);
    }

    fn new_intent(&mut self, kind: IntentKind, restore: CaptionStatus) -> IntentToken {
        let token = IntentToken(self.next_token);
        self.next_token += 1;
        self.intent = Some(Intent { token, kind, restore });
        self.reset_at = None;
        token
    }

    fn latest_is(&self, kind: IntentKind) -> bool {
        self.intent.is_some_and(|i| i.kind == kind)
    }

    fn refuse_unsupported(&self) -> bool {
        if !self.supported {
            self.say("Live captions not supported", Politeness::Assertive);
        }
        !self.supported
    }

    /// Ask for captions. Returns the command to run, if any.
    pub fn request_start(&mut self) -> Option<CaptionCommand> {
        if self.refuse_unsupported() {
            return None;
        }
        match self.status {
            CaptionStatus::Active => return None,
            CaptionStatus::Starting if self.latest_is(IntentKind::Start) => return None,
            _ => {}
        }
        let token = self.new_intent(IntentKind::Start, CaptionStatus::Idle);
        self.status = CaptionStatus::Starting;
        tracing::debug!(?token, "caption start requested");
        Some(CaptionCommand::Start { token, language: self.config.language.clone() })
    }

    /// Ask to stop captions. Returns the command to run, if any.
    ///
    /// Stopping while a start is still in flight drops straight to `Idle`
    /// and still stops the transport, since its start may yet succeed.
    pub fn request_stop(&mut self) -> Option<CaptionCommand> {
        if self.refuse_unsupported() {
            return None;
        }
        let restore = match self.status {
            CaptionStatus::Active => CaptionStatus::Active,
            CaptionStatus::Starting => {
                self.status = CaptionStatus::Idle;
                CaptionStatus::Idle
            }
            CaptionStatus::Idle | CaptionStatus::Error => return None,
        };
        let token = self.new_intent(IntentKind::Stop, restore);
        tracing::debug!(?token, "caption stop requested");
        Some(CaptionCommand::Stop { token })
    }

    /// Toggle based on the current status
    pub fn toggle(&mut self) -> Option<CaptionCommand> {
        match self.status {
            CaptionStatus::Active | CaptionStatus::Starting => self.request_stop(),
            CaptionStatus::Idle | CaptionStatus::Error => self.request_start(),
        }
    }

    /// Report the transport's answer to a command
    pub fn complete(&mut self, token: IntentToken, result: Result<(), TransportError>) {
        let Some(intent) = self.intent.filter(|i| i.token == token) else {
            tracing::trace!(?token, "stale caption result ignored");
            return;
        };
        match result {
            Ok(()) => match intent.kind {
                IntentKind::Start => self.say("Starting live captions...", Politeness::Polite),
                IntentKind::Stop => self.say("Stopping live captions...", Politeness::Polite),
            },
            Err(e) => {
                tracing::error!(error = %e, "closed captions toggle error");
                self.status = CaptionStatus::Error;
                self.say("Failed to toggle captions", Politeness::Assertive);
                self.reset_at = Some((self.clock.now_ms() + self.config.error_reset_ms, intent.restore));
            }
        }
    }

    /// Adopt captions that were already running when the call was joined
    pub fn adopt_active(&mut self) {
        tracing::debug!("adopting running transcription");
        self.status = CaptionStatus::Active;
    }

    /// Leave `Error` by hand
    pub fn reset(&mut self) {
        if self.status == CaptionStatus::Error {
            self.status = CaptionStatus::Idle;
            self.reset_at = None;
        }
    }

    /// Forget everything about the session (call left)
    pub fn clear(&mut self) {
        self.status = CaptionStatus::Idle;
        self.supported = true;
        self.transcript.clear();
        self.roster.clear();
        self.intent = None;
        self.reset_at = None;
    }

    /// Fire the error auto-reset when due
    pub fn poll(&mut self) {
        let Some((deadline, restore)) = self.reset_at else { return };
        if self.clock.now_ms() < deadline {
            return;
        }
        self.reset_at = None;
        if self.status == CaptionStatus::Error && self.supported {
            tracing::debug!(to = %restore, "caption error reset");
            self.status = restore;
        }
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.reset_at.map(|(deadline, _)| deadline)
    }

    /// Apply a transport event. Returns false when the event was discarded.
    pub fn handle_event(&mut self, event: &VideoEvent) -> bool {
        match event {
            VideoEvent::ParticipantJoined { participant, .. } | VideoEvent::ParticipantUpdated { participant, .. } => {
                self.roster.upsert(participant.clone());
                true
            }
            VideoEvent::ParticipantLeft { session_id, .. } => self.roster.remove(session_id).is_some(),
            VideoEvent::CaptionsStarted { .. } => self.on_started(),
            VideoEvent::CaptionsStopped { .. } => self.on_stopped(),
            VideoEvent::CaptionsFailed { reason, .. } | VideoEvent::TranscriptionFailed { reason, .. } => {
                self.on_failed(reason.as_deref());
                true
            }
            VideoEvent::Caption { caption, .. } => self.on_caption(caption),
        }
    }

    fn on_started(&mut self) -> bool {
        if self.latest_is(IntentKind::Stop) || !self.supported {
            tracing::debug!("late captions_started ignored");
            return false;
        }
        self.status = CaptionStatus::Active;
        self.reset_at = None;
        self.transcript.clear();
        self.say("Live captions started", Politeness::Polite);
        true
    }

    fn on_stopped(&mut self) -> bool {
        if self.status == CaptionStatus::Starting && self.latest_is(IntentKind::Start) {
            tracing::debug!("captions_stopped from an earlier session ignored");
            return false;
        }
        self.status = CaptionStatus::Idle;
        self.reset_at = None;
        self.say("Live captions stopped", Politeness::Polite);
        true
    }

    fn on_failed(&mut self, reason: Option<&str>) {
        tracing::error!(reason = reason.unwrap_or("unknown"), "transcription failed");
        self.status = CaptionStatus::Error;
        self.supported = false;
        self.intent = None;
        self.reset_at = None;
        self.say("Live captions failed - feature may not be available", Politeness::Assertive);
    }

    /// Captions are kept whatever the status; the pipeline may deliver
    /// fragments before `captions_started` or after a failed command.
    fn on_caption(&mut self, caption: &CaptionEvent) -> bool {
        let text = caption.text.trim();
        if text.is_empty() {
            return false;
        }

        let now = self.clock.now_ms();
        let key = caption.speaker_key();
        let entry = TranscriptEntry {
            session_key: if key.is_empty() { format!("session-{now}") } else { key.to_string() },
            text: text.to_string(),
            speaker_id: (!key.is_empty()).then(|| key.to_string()),
            speaker_name: self.roster.speaker_name(caption),
            timestamp_ms: now,
            is_final: caption.is_final,
        };

        // One provisional line per speaker; a final line supersedes it too
        self.transcript.retain(|t| t.is_final || t.speaker_id != entry.speaker_id);
        if entry.is_final {
            self.say(&format!("{}: {}", entry.speaker_name, entry.text), Politeness::Polite);
        }
        self.transcript.push(entry);

        let excess = self.transcript.len().saturating_sub(self.config.capacity);
        self.transcript.drain(..excess);
        true
    }
}
