//! In-memory chat transport
//!
//! Backs the replay driver and the test suites. Messages live in a
//! per-channel canonical list ordered by `created_at_ms`; failures can be
//! switched on per operation.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::transport::{
    Attachment, ChannelId, ChatEvent, ChatEventKind, ChatTransport, FileUpload, HandlerId,
    MessageRecord, TransportError, UploadedFile,
};

#[derive(Debug, Default)]
struct State {
    channels: HashMap<ChannelId, Vec<MessageRecord>>,
    handlers: Vec<(HandlerId, ChannelId, ChatEventKind)>,
    next_handler: u64,
    next_message: u64,
    sent: Vec<(ChannelId, String, Vec<Attachment>)>,
    uploads: Vec<String>,
}

/// Chat transport with no network behind it
#[derive(Debug, Default)]
pub struct MemoryChatTransport {
    user_id: Option<String>,
    state: RefCell<State>,
    fail_queries: Cell<bool>,
    fail_sends: Cell<bool>,
    fail_uploads: Cell<bool>,
}

fn insert_ordered(list: &mut Vec<MessageRecord>, message: MessageRecord) {
    if let Some(existing) = list.iter_mut().find(|m| m.id == message.id) {
        *existing = message;
        return;
    }
    let at = list.partition_point(|m| m.created_at_ms <= message.created_at_ms);
    list.insert(at, message);
}

impl MemoryChatTransport {
    pub fn new(user_id: Option<&str>) -> Self {
        Self { user_id: user_id.map(String::from), ..Default::default() }
    }

    pub fn fail_queries(&self, fail: bool) {
        self.fail_queries.set(fail);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.set(fail);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.set(fail);
    }

    /// Seed history without notifying anyone
    pub fn seed(&self, channel: &ChannelId, message: MessageRecord) {
        let mut state = self.state.borrow_mut();
        insert_ordered(state.channels.entry(channel.clone()).or_default(), message);
    }

    /// Apply a server-side event to the canonical state.
    ///
    /// Returns true when someone is subscribed to it and it should be
    /// delivered.
    pub fn publish(&self, event: &ChatEvent) -> bool {
        let mut state = self.state.borrow_mut();
        let list = state.channels.entry(event.channel().clone()).or_default();
        match event {
            ChatEvent::MessageNew { message, .. } | ChatEvent::MessageUpdated { message, .. } => {
                insert_ordered(list, message.clone());
            }
            ChatEvent::MessageDeleted { message_id, .. } => list.retain(|m| &m.id != message_id),
        }
        let kind = event.kind();
        state.handlers.iter().any(|(_, c, k)| c == event.channel() && *k == kind)
    }

    /// Live subscriptions on a channel
    pub fn handler_count(&self, channel: &ChannelId) -> usize {
        self.state.borrow().handlers.iter().filter(|(_, c, _)| c == channel).count()
    }

    /// Messages accepted by `send_message`, oldest first
    pub fn sent(&self) -> Vec<(ChannelId, String, Vec<Attachment>)> {
        self.state.borrow().sent.clone()
    }

    /// Names of uploaded files, oldest first
    pub fn uploads(&self) -> Vec<String> {
        self.state.borrow().uploads.clone()
    }
}

impl ChatTransport for MemoryChatTransport {
    fn local_user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    async fn query_messages(&self, channel: &ChannelId, limit: usize) -> Result<Vec<MessageRecord>, TransportError> {
        if self.fail_queries.get() {
            return Err(TransportError::Network(format!("query {channel} failed")));
        }
        let state = self.state.borrow();
        let list = state.channels.get(channel).map(Vec::as_slice).unwrap_or_default();
        Ok(list[list.len().saturating_sub(limit)..].to_vec())
    }

    fn messages(&self, channel: &ChannelId) -> Vec<MessageRecord> {
        self.state.borrow().channels.get(channel).cloned().unwrap_or_default()
    }

    fn on(&self, channel: &ChannelId, kind: ChatEventKind) -> HandlerId {
        let mut state = self.state.borrow_mut();
        let id = HandlerId(state.next_handler);
        state.next_handler += 1;
        state.handlers.push((id, channel.clone(), kind));
        id
    }

    fn off(&self, handler: HandlerId) {
        self.state.borrow_mut().handlers.retain(|(id, _, _)| *id != handler);
    }

    async fn send_message(&self, channel: &ChannelId, text: &str, attachments: Vec<Attachment>) -> Result<MessageRecord, TransportError> {
        if self.fail_sends.get() {
            return Err(TransportError::Network("send failed".into()));
        }
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.next_message += 1;
        let list = state.channels.entry(channel.clone()).or_default();
        let message = MessageRecord {
            id: format!("local-{}", state.next_message),
            author_id: self.user_id.clone().unwrap_or_default(),
            author_name: None,
            text: text.to_string(),
            attachments: attachments.clone(),
            created_at_ms: list.last().map_or(0, |m| m.created_at_ms + 1),
        };
        insert_ordered(list, message.clone());
        state.sent.push((channel.clone(), text.to_string(), attachments));
        Ok(message)
    }

    async fn upload_file(&self, file: &FileUpload) -> Result<UploadedFile, TransportError> {
        if self.fail_uploads.get() {
            return Err(TransportError::Rejected(format!("upload of {} refused", file.name)));
        }
        self.state.borrow_mut().uploads.push(file.name.clone());
        Ok(UploadedFile { url: format!("memory://uploads/{}", file.name) })
    }
}
