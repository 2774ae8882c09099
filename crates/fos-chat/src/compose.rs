//! Message Composer
//!
//! Draft text plus pending attachments, validated before they reach the
//! transport, and the upload-then-send flow.

use std::rc::Rc;

use fos_a11y::{Announcer, Politeness};

use crate::transport::{Attachment, AttachmentKind, ChannelId, ChatTransport, FileUpload, MessageRecord};
use crate::{ChatConfig, ChatError};

/// Message draft and send flow
#[derive(Debug)]
pub struct MessageComposer<T: ChatTransport> {
    transport: Rc<T>,
    announcer: Announcer,
    config: ChatConfig,
    text: String,
    attachments: Vec<FileUpload>,
}

impl<T: ChatTransport> MessageComposer<T> {
    pub fn new(transport: Rc<T>, announcer: Announcer, config: ChatConfig) -> Self {
        Self {
            transport,
            announcer,
            config,
            text: String::new(),
            attachments: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    pub fn attachments(&self) -> &[FileUpload] {
        &self.attachments
    }

    /// Discard the draft text
    pub fn clear(&mut self) {
        self.text.clear();
        self.announcer.announce("Message cleared", Politeness::Polite);
    }

    /// Check size and type limits for one file
    pub fn validate_file(&self, file: &FileUpload) -> Result<(), ChatError> {
        if file.size > self.config.max_file_size {
            return Err(ChatError::FileTooLarge {
                name: file.name.clone(),
                max_bytes: self.config.max_file_size,
            });
        }

        let name = file.name.to_lowercase();
        let allowed = self.config.allowed_file_types.iter().any(|t| match t.strip_suffix("/*") {
            Some(prefix) => file.mime_type.starts_with(prefix),
            None => name.ends_with(&t.to_lowercase()),
        });
        if !allowed {
            return Err(ChatError::FileTypeNotAllowed(file.mime_type.clone()));
        }
        Ok(())
    }

    /// Queue the valid files; every rejected file is announced.
    /// Returns how many were added.
    pub fn add_files(&mut self, files: Vec<FileUpload>) -> usize {
        let mut added = 0;
        for file in files {
            match self.validate_file(&file) {
                Ok(()) => {
                    self.attachments.push(file);
                    added += 1;
                }
                Err(e) => {
                    tracing::debug!(file = %file.name, error = %e, "attachment rejected");
                    self.announcer.announce(&e.to_string(), Politeness::Assertive);
                }
            }
        }
        if added > 0 {
            let plural = if added == 1 { "" } else { "s" };
            self.announcer.announce(&format!("Added {added} attachment{plural}"), Politeness::Polite);
        }
        added
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<FileUpload> {
        if index >= self.attachments.len() {
            return None;
        }
        let removed = self.attachments.remove(index);
        self.announcer.announce(&format!("Removed attachment {}", removed.name), Politeness::Polite);
        Some(removed)
    }

    fn check_draft(&self) -> Result<(), ChatError> {
        if self.text.trim().is_empty() && self.attachments.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let len = self.text.chars().count();
        if len > self.config.max_message_length {
            return Err(ChatError::MessageTooLong { len, max: self.config.max_message_length });
        }
        Ok(())
    }

    /// Upload pending files, then send the message.
    ///
    /// The draft is cleared only on success. Transport failures are
    /// announced and returned; nothing is retried.
    pub async fn send(&mut self, channel: &ChannelId) -> Result<MessageRecord, ChatError> {
        if let Err(e) = self.check_draft() {
            self.announcer.announce(&e.to_string(), Politeness::Assertive);
            return Err(e);
        }

        match self.upload_and_send(channel).await {
            Ok(message) => {
                self.text.clear();
                self.attachments.clear();
                self.announcer.announce("Message sent successfully", Politeness::Polite);
                Ok(message)
            }
            Err(e) => {
                tracing::error!(%channel, error = %e, "error sending message");
                self.announcer.announce("Failed to send message", Politeness::Assertive);
                Err(e)
            }
        }
    }

    async fn upload_and_send(&self, channel: &ChannelId) -> Result<MessageRecord, ChatError> {
        let mut uploaded = Vec::with_capacity(self.attachments.len());
        for file in &self.attachments {
            let result = self.transport.upload_file(file).await?;
            if result.url.is_empty() {
                tracing::warn!(file = %file.name, "upload returned no url; dropping attachment");
                continue;
            }
            uploaded.push(Attachment {
                kind: AttachmentKind::from_mime(&file.mime_type),
                title: Some(file.name.clone()),
                url: Some(result.url),
                mime_type: Some(file.mime_type.clone()),
                file_size: Some(file.size),
                ..Default::default()
            });
        }
        Ok(self.transport.send_message(channel, &self.text, uploaded).await?)
    }
}
