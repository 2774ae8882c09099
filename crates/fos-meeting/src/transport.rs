//! Video transport interface

use std::fmt;

use serde::Deserialize;

/// Call identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub String);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Call participant
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Participant {
    pub user_id: String,
    pub session_id: String,
    pub name: Option<String>,
    pub is_local: bool,
}

impl Participant {
    /// Name shown on the participant tile
    pub fn label(&self) -> String {
        let base = match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ if !self.user_id.is_empty() => &self.user_id,
            _ => "Participant",
        };
        if self.is_local { format!("{base} (You)") } else { base.to_string() }
    }
}

fn final_by_default() -> bool {
    true
}

/// One caption fragment from the speech pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CaptionEvent {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub speaker_id: Option<String>,
    /// Speaker's transport user id, when the pipeline reports it separately
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default = "final_by_default")]
    pub is_final: bool,
}

impl CaptionEvent {
    /// Identifier the fragment is attributed to; empty when unknown
    pub fn speaker_key(&self) -> &str {
        self.speaker_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.user_id.as_deref())
            .unwrap_or_default()
    }
}

/// Subscribable event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoEventKind {
    ParticipantJoined,
    ParticipantLeft,
    ParticipantUpdated,
    CaptionsStarted,
    CaptionsStopped,
    CaptionsFailed,
    TranscriptionFailed,
    Caption,
}

impl VideoEventKind {
    pub const ALL: [Self; 8] = [
        Self::ParticipantJoined,
        Self::ParticipantLeft,
        Self::ParticipantUpdated,
        Self::CaptionsStarted,
        Self::CaptionsStopped,
        Self::CaptionsFailed,
        Self::TranscriptionFailed,
        Self::Caption,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParticipantJoined => "participantJoined",
            Self::ParticipantLeft => "participantLeft",
            Self::ParticipantUpdated => "participantUpdated",
            Self::CaptionsStarted => "call.closed_captions_started",
            Self::CaptionsStopped => "call.closed_captions_stopped",
            Self::CaptionsFailed => "call.closed_captions_failed",
            Self::TranscriptionFailed => "call.transcription_failed",
            Self::Caption => "call.closed_caption",
        }
    }
}

/// Call event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VideoEvent {
    ParticipantJoined { call: CallId, participant: Participant },
    ParticipantLeft { call: CallId, session_id: String },
    ParticipantUpdated { call: CallId, participant: Participant },
    CaptionsStarted { call: CallId },
    CaptionsStopped { call: CallId },
    CaptionsFailed { call: CallId, #[serde(default)] reason: Option<String> },
    TranscriptionFailed { call: CallId, #[serde(default)] reason: Option<String> },
    Caption { call: CallId, caption: CaptionEvent },
}

impl VideoEvent {
    pub fn call(&self) -> &CallId {
        match self {
            Self::ParticipantJoined { call, .. }
            | Self::ParticipantLeft { call, .. }
            | Self::ParticipantUpdated { call, .. }
            | Self::CaptionsStarted { call }
            | Self::CaptionsStopped { call }
            | Self::CaptionsFailed { call, .. }
            | Self::TranscriptionFailed { call, .. }
            | Self::Caption { call, .. } => call,
        }
    }

    pub fn kind(&self) -> VideoEventKind {
        match self {
            Self::ParticipantJoined { .. } => VideoEventKind::ParticipantJoined,
            Self::ParticipantLeft { .. } => VideoEventKind::ParticipantLeft,
            Self::ParticipantUpdated { .. } => VideoEventKind::ParticipantUpdated,
            Self::CaptionsStarted { .. } => VideoEventKind::CaptionsStarted,
            Self::CaptionsStopped { .. } => VideoEventKind::CaptionsStopped,
            Self::CaptionsFailed { .. } => VideoEventKind::CaptionsFailed,
            Self::TranscriptionFailed { .. } => VideoEventKind::TranscriptionFailed,
            Self::Caption { .. } => VideoEventKind::Caption,
        }
    }
}

/// Subscription handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u64);

/// Transport error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Not in a call")]
    NotJoined,
}

/// Video call service
///
/// Methods take `&self`; implementations keep interior state.
#[allow(async_fn_in_trait)]
pub trait VideoTransport {
    async fn join(&self, call: &CallId) -> Result<(), TransportError>;
    async fn leave(&self) -> Result<(), TransportError>;

    async fn enable_camera(&self) -> Result<(), TransportError>;
    async fn disable_camera(&self) -> Result<(), TransportError>;
    async fn enable_microphone(&self) -> Result<(), TransportError>;
    async fn disable_microphone(&self) -> Result<(), TransportError>;
    fn camera_enabled(&self) -> bool;
    fn microphone_enabled(&self) -> bool;

    async fn start_closed_captions(&self, language: &str) -> Result<(), TransportError>;
    async fn stop_closed_captions(&self) -> Result<(), TransportError>;
    /// Whether the call is already being transcribed
    fn is_transcribing(&self) -> bool;

    /// Current participants, local first
    fn participants(&self) -> Vec<Participant>;

    /// Subscribe to one event type on one call
    fn on(&self, call: &CallId, kind: VideoEventKind) -> HandlerId;

    /// Remove a subscription. Unknown ids are ignored.
    fn off(&self, handler: HandlerId);
}
