//! fOS Overlay
//!
//! Accessible chat and meeting overlay: the composition root that wires
//! the announcer, focus and keyboard navigation, the chat bridge and the
//! call controller over one headless document.
//!
//! # Example
//! ```rust,ignore
//! use fos_overlay::{Overlay, OverlayConfig};
//!
//! let mut overlay = Overlay::new(&OverlayConfig::default(), chat, video, clock)?;
//! overlay.open_channel("general".into()).await?;
//! overlay.join("standup".into()).await?;
//! ```

mod config;
mod logging;
mod overlay;
pub mod replay;
pub mod view;

pub use config::OverlayConfig;
pub use logging::init_logging;
pub use overlay::Overlay;
pub use replay::{replay, Replay, Script, SpokenLine, Step};
pub use view::{Control, ControlState, OverlayView};

/// Overlay error
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Document error: {0}")]
    Dom(#[from] fos_dom::DomError),

    #[error(transparent)]
    Chat(#[from] fos_chat::ChatError),

    #[error(transparent)]
    Meeting(#[from] fos_meeting::MeetingError),

    #[error("Invalid configuration: {0}")]
    Config(#[source] serde_json::Error),

    #[error("Invalid replay script: {0}")]
    Script(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
