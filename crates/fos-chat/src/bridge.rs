//! Message Accessibility Bridge
//!
//! Keeps an accessible read model of the active channel's messages and
//! announces incoming messages from other people.
//!
//! At most one channel is active. Switching detaches every handler from
//! the old channel before attaching to the new one, and events carrying
//! any other channel id are dropped, so nothing from a previous channel can
//! reach the list or the live region.

use std::rc::Rc;

use fos_a11y::{Announcer, Politeness};

use crate::describe::typing_text;
use crate::transport::{ChannelId, ChatEvent, ChatEventKind, ChatTransport, HandlerId, MessageRecord};
use crate::{ChatConfig, ChatError};

/// Accessible message list for the active channel
#[derive(Debug)]
pub struct MessageAccessibilityBridge<T: ChatTransport> {
    transport: Rc<T>,
    announcer: Announcer,
    config: ChatConfig,
    active: Option<ChannelId>,
    handlers: Vec<(ChatEventKind, HandlerId)>,
    messages: Vec<MessageRecord>,
    typing: Vec<String>,
}

impl<T: ChatTransport> MessageAccessibilityBridge<T> {
    pub fn new(transport: Rc<T>, announcer: Announcer, config: ChatConfig) -> Self {
        Self {
            transport,
            announcer,
            config,
            active: None,
            handlers: Vec::new(),
            messages: Vec::new(),
            typing: Vec::new(),
        }
    }

    pub fn active_channel(&self) -> Option<&ChannelId> {
        self.active.as_ref()
    }

    /// Current read model, in canonical order
    pub fn messages(&self) -> &[MessageRecord] {
        &self.messages
    }

    /// Navigation labels, one per message
    pub fn labels(&self) -> Vec<String> {
        self.messages.iter().map(|m| format!("message from {}", m.author_label())).collect()
    }

    /// Make `channel` the active channel and load its recent history.
    ///
    /// Switching to the channel that is already active does nothing. A
    /// failed history fetch is returned, but the subscriptions stay in place
    /// so later events still arrive.
    pub async fn switch_to(&mut self, channel: ChannelId) -> Result<(), ChatError> {
        if self.active.as_ref() == Some(&channel) {
            tracing::trace!(%channel, "channel already active");
            return Ok(());
        }

        self.detach();
        for kind in ChatEventKind::ALL {
            let id = self.transport.on(&channel, kind);
            self.handlers.push((kind, id));
        }
        tracing::info!(%channel, "chat channel active");
        self.active = Some(channel.clone());

        let page = self
            .transport
            .query_messages(&channel, self.config.page_size)
            .await
            .inspect_err(|e| tracing::warn!(%channel, error = %e, "failed to load messages"))?;

        for message in page {
            self.merge(message);
        }
        tracing::debug!(%channel, count = self.messages.len(), "messages loaded");
        Ok(())
    }

    /// Unsubscribe and forget the active channel
    pub fn detach(&mut self) {
        for (kind, id) in self.handlers.drain(..) {
            self.transport.off(id);
            tracing::trace!(event = kind.as_str(), "handler detached");
        }
        if let Some(channel) = self.active.take() {
            tracing::debug!(%channel, "chat channel detached");
        }
        self.messages.clear();
        self.typing.clear();
    }

    fn is_subscribed(&self, kind: ChatEventKind) -> bool {
        self.handlers.iter().any(|(k, _)| *k == kind)
    }

    /// Insert or replace by id, keeping creation order
    fn merge(&mut self, message: MessageRecord) -> bool {
        if let Some(existing) = self.messages.iter_mut().find(|m| m.id == message.id) {
            *existing = message;
            return false;
        }
        let at = self.messages.partition_point(|m| m.created_at_ms <= message.created_at_ms);
        self.messages.insert(at, message);
        true
    }

    /// Apply a transport event. Returns false when it was not for us.
    pub fn handle_event(&mut self, event: &ChatEvent) -> bool {
        let Some(active) = &self.active else { return false };
        if event.channel() != active || !self.is_subscribed(event.kind()) {
            tracing::trace!(channel = %event.channel(), event = event.kind().as_str(), "event ignored");
            return false;
        }

        match event {
            ChatEvent::MessageNew { message, .. } => {
                let inserted = self.merge(message.clone());
                if inserted {
                    self.announce_new(message);
                }
            }
            ChatEvent::MessageUpdated { channel, .. } | ChatEvent::MessageDeleted { channel, .. } => {
                self.messages = self.transport.messages(channel);
            }
        }
        true
    }

    fn announce_new(&self, message: &MessageRecord) {
        let Some(local) = self.transport.local_user_id() else { return };
        if message.author_id == local {
            return;
        }
        let body = if message.text.trim().is_empty() { "sent an attachment" } else { &message.text };
        self.announcer.announce(
            &format!("New message from {}: {body}", message.author_label()),
            Politeness::Polite,
        );
    }

    /// Update who is typing; announces when the set changes
    pub fn set_typing(&mut self, users: Vec<String>) {
        if users == self.typing {
            return;
        }
        if let Some(text) = typing_text(&users) {
            self.announcer.announce(&text, Politeness::Polite);
        }
        self.typing = users;
    }

    pub fn typing(&self) -> &[String] {
        &self.typing
    }
}

impl<T: ChatTransport> Drop for MessageAccessibilityBridge<T> {
    fn drop(&mut self) {
        for (_, id) in self.handlers.drain(..) {
            self.transport.off(id);
        }
    }
}
