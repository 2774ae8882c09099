//! fOS Meeting
//!
//! Accessibility layer over a video call.
//!
//! Features:
//! - Live caption state machine with intent tokens and a bounded transcript
//! - Participant roster and caption speaker resolution
//! - Call controller: join/leave, device and caption toggles
//! - In-memory transport for replay and tests

pub mod call;
pub mod captions;
pub mod memory;
pub mod roster;
pub mod transport;

pub use call::{CallConfig, CallController};
pub use captions::{CaptionCommand, CaptionConfig, CaptionStateMachine, CaptionStatus, IntentToken, TranscriptEntry};
pub use memory::{MemoryVideoTransport, VideoOp};
pub use roster::Roster;
pub use transport::{
    CallId, CaptionEvent, HandlerId, Participant, TransportError, VideoEvent, VideoEventKind, VideoTransport,
};

/// Meeting error
#[derive(Debug, thiserror::Error)]
pub enum MeetingError {
    #[error("Failed to join meeting: {0}")]
    Join(#[source] TransportError),

    #[error("Error leaving meeting: {0}")]
    Leave(#[source] TransportError),
}
