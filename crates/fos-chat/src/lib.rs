//! fOS Chat
//!
//! Accessibility layer over a messaging channel.
//!
//! Features:
//! - Message bridge: one subscription set per active channel, merged
//!   message list, new-message announcements
//! - Composer: input validation and the upload-then-send flow
//! - Spoken descriptions for attachments, file sizes and emoji
//! - In-memory transport for replay and tests

pub mod bridge;
pub mod compose;
pub mod describe;
pub mod memory;
pub mod transport;

pub use bridge::MessageAccessibilityBridge;
pub use compose::MessageComposer;
pub use describe::{attachment_description, emoji_label, format_file_size, spoken_text, typing_text};
pub use memory::MemoryChatTransport;
pub use transport::{
    Attachment, AttachmentKind, ChannelId, ChatEvent, ChatEventKind, ChatTransport, FileUpload,
    HandlerId, MessageRecord, TransportError, UploadedFile,
};

use serde::Deserialize;

const MIB: u64 = 1024 * 1024;

/// Chat configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Messages fetched when a channel becomes active
    pub page_size: usize,
    /// Maximum message length in characters
    pub max_message_length: usize,
    /// Maximum attachment size in bytes
    pub max_file_size: u64,
    /// MIME wildcards (`image/*`) or filename extensions (`.pdf`)
    pub allowed_file_types: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_message_length: 1000,
            max_file_size: 10 * MIB,
            allowed_file_types: ["image/*", "video/*", "audio/*", ".pdf", ".doc", ".docx", ".xls", ".xlsx"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Size in whole megabytes where exact, otherwise two decimals
fn megabytes(bytes: &u64) -> String {
    if bytes % MIB == 0 {
        (bytes / MIB).to_string()
    } else {
        format!("{:.2}", *bytes as f64 / MIB as f64)
    }
}

/// Chat error
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message or attachment required")]
    EmptyMessage,

    #[error("Message exceeds maximum length of {max} characters")]
    MessageTooLong { len: usize, max: usize },

    #[error("File {name} exceeds maximum size of {}MB", megabytes(max_bytes))]
    FileTooLarge { name: String, max_bytes: u64 },

    #[error("File type {0} is not allowed")]
    FileTypeNotAllowed(String),

    #[error("No active channel")]
    NoActiveChannel,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
