//! Chat transport interface
//!
//! The messaging service is external. The bridge only needs a bulk fetch,
//! the canonical message snapshot, per-channel subscriptions, and the two
//! operations behind the send flow.

use std::fmt;

use serde::Deserialize;

/// Channel identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Attachment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    #[default]
    File,
}

impl AttachmentKind {
    /// Classify by the MIME top-level type
    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next().unwrap_or_default() {
            "image" => Self::Image,
            "video" => Self::Video,
            "audio" => Self::Audio,
            _ => Self::File,
        }
    }
}

/// Message attachment
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub title: Option<String>,
    pub url: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
    pub alt_text: Option<String>,
}

/// Chat message, as the transport orders it
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MessageRecord {
    pub id: String,
    pub author_id: String,
    pub author_name: Option<String>,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub created_at_ms: u64,
}

impl MessageRecord {
    /// Author display name, falling back to the id, then "Unknown user"
    pub fn author_label(&self) -> &str {
        match self.author_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ if !self.author_id.is_empty() => &self.author_id,
            _ => "Unknown user",
        }
    }
}

/// Local file selected for upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Upload result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub url: String,
}

/// Subscribable event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatEventKind {
    MessageNew,
    MessageUpdated,
    MessageDeleted,
}

impl ChatEventKind {
    pub const ALL: [Self; 3] = [Self::MessageNew, Self::MessageUpdated, Self::MessageDeleted];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MessageNew => "message.new",
            Self::MessageUpdated => "message.updated",
            Self::MessageDeleted => "message.deleted",
        }
    }
}

/// Channel event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    MessageNew { channel: ChannelId, message: MessageRecord },
    MessageUpdated { channel: ChannelId, message: MessageRecord },
    MessageDeleted { channel: ChannelId, message_id: String },
}

impl ChatEvent {
    pub fn channel(&self) -> &ChannelId {
        match self {
            Self::MessageNew { channel, .. }
            | Self::MessageUpdated { channel, .. }
            | Self::MessageDeleted { channel, .. } => channel,
        }
    }

    pub fn kind(&self) -> ChatEventKind {
        match self {
            Self::MessageNew { .. } => ChatEventKind::MessageNew,
            Self::MessageUpdated { .. } => ChatEventKind::MessageUpdated,
            Self::MessageDeleted { .. } => ChatEventKind::MessageDeleted,
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

    #[error("Channel not found: {0}")]
    ChannelNotFound(ChannelId),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Messaging service
///
/// All methods take `&self`; implementations keep their own interior
/// state so one transport can be shared by the bridge and the composer.
#[allow(async_fn_in_trait)]
pub trait ChatTransport {
    /// Signed-in user, if any
    fn local_user_id(&self) -> Option<&str>;

    /// Fetch the latest `limit` messages and refresh the canonical state
    async fn query_messages(&self, channel: &ChannelId, limit: usize) -> Result<Vec<MessageRecord>, TransportError>;

    /// Canonical ordered message state for a channel
    fn messages(&self, channel: &ChannelId) -> Vec<MessageRecord>;

    /// Subscribe to one event type on one channel
    fn on(&self, channel: &ChannelId, kind: ChatEventKind) -> HandlerId;

    /// Remove a subscription. Unknown ids are ignored.
    fn off(&self, handler: HandlerId);

    async fn send_message(&self, channel: &ChannelId, text: &str, attachments: Vec<Attachment>) -> Result<MessageRecord, TransportError>;

    async fn upload_file(&self, file: &FileUpload) -> Result<UploadedFile, TransportError>;
}
