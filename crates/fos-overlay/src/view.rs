//! Overlay document layout
//!
//! Builds the accessible markup the overlay owns inside the headless
//! document: the message log, the composer, the caption list, the call
//! toolbar and the settings dialog. Existing nodes are updated in place so
//! a focused item survives a re-render.

use fos_chat::{attachment_description, spoken_text, MessageRecord};
use fos_dom::{Document, DomError, NodeId};
use fos_meeting::TranscriptEntry;
use serde::Deserialize;

const TOOLBAR_LABEL: &str = "Video call controls. Use arrow keys to navigate, Enter to activate.";

/// Call toolbar button, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Microphone,
    Camera,
    Captions,
    Settings,
    Leave,
}

impl Control {
    pub const ALL: [Control; 5] = [
        Control::Microphone,
        Control::Camera,
        Control::Captions,
        Control::Settings,
        Control::Leave,
    ];

    /// Accessible name for the button given its pressed state
    pub fn label(self, on: bool) -> &'static str {
        match (self, on) {
            (Self::Microphone, true) => "Turn off microphone",
            (Self::Microphone, false) => "Turn on microphone",
            (Self::Camera, true) => "Turn off camera",
            (Self::Camera, false) => "Turn on camera",
            (Self::Captions, true) => "Turn off live captions",
            (Self::Captions, false) => "Turn on live captions",
            (Self::Settings, _) => "Call settings",
            (Self::Leave, _) => "Leave call",
        }
    }

    fn toggles(self) -> bool {
        matches!(self, Self::Microphone | Self::Camera | Self::Captions)
    }
}

/// Pressed state of the toggle buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub microphone: bool,
    pub camera: bool,
    pub captions: bool,
}

impl ControlState {
    fn get(&self, control: Control) -> bool {
        match control {
            Control::Microphone => self.microphone,
            Control::Camera => self.camera,
            Control::Captions => self.captions,
            Control::Settings | Control::Leave => false,
        }
    }
}

/// Node ids of the overlay's markup
#[derive(Debug)]
pub struct OverlayView {
    message_list: NodeId,
    message_items: Vec<NodeId>,
    composer: NodeId,
    transcript: NodeId,
    transcript_items: Vec<NodeId>,
    toolbar: NodeId,
    buttons: Vec<(Control, NodeId)>,
    settings: Option<NodeId>,
}

impl OverlayView {
    pub fn build(doc: &mut Document) -> Result<Self, DomError> {
        let body = doc.body();
        let main = doc.append_element(body, "main")?;

        let message_list = doc.append_element(main, "ul")?;
        doc.set_attribute(message_list, "role", "log")?;
        doc.set_attribute(message_list, "aria-label", "Messages")?;

        let composer = doc.append_element(main, "textarea")?;
        doc.set_attribute(composer, "aria-label", "Type a message")?;
        doc.set_attribute(
            composer,
            "aria-description",
            "Enter to send message, Shift+Enter for new line, Escape to clear",
        )?;

        let transcript = doc.append_element(main, "ol")?;
        doc.set_attribute(transcript, "aria-label", "Live captions")?;

        let toolbar = doc.append_element(main, "div")?;
        doc.set_attribute(toolbar, "role", "toolbar")?;
        doc.set_attribute(toolbar, "aria-label", TOOLBAR_LABEL)?;

        let mut buttons = Vec::with_capacity(Control::ALL.len());
        for control in Control::ALL {
            let button = doc.append_element(toolbar, "button")?;
            doc.set_attribute(button, "aria-label", control.label(false))?;
            if control.toggles() {
                doc.set_attribute(button, "aria-pressed", "false")?;
            }
            buttons.push((control, button));
        }

        Ok(Self {
            message_list,
            message_items: Vec::new(),
            composer,
            transcript,
            transcript_items: Vec::new(),
            toolbar,
            buttons,
            settings: None,
        })
    }

    pub fn message_list(&self) -> NodeId {
        self.message_list
    }

    pub fn message_nodes(&self) -> &[NodeId] {
        &self.message_items
    }

    pub fn composer(&self) -> NodeId {
        self.composer
    }

    pub fn transcript_nodes(&self) -> &[NodeId] {
        &self.transcript_items
    }

    pub fn toolbar(&self) -> NodeId {
        self.toolbar
    }

    pub fn control_nodes(&self) -> Vec<NodeId> {
        self.buttons.iter().map(|(_, node)| *node).collect()
    }

    pub fn control_at(&self, index: usize) -> Option<Control> {
        self.buttons.get(index).map(|(control, _)| *control)
    }

    pub fn control_node(&self, control: Control) -> Option<NodeId> {
        self.buttons.iter().find(|(c, _)| *c == control).map(|(_, node)| *node)
    }

    pub fn settings_dialog(&self) -> Option<NodeId> {
        self.settings
    }

    /// Sync the message log with the read model
    pub fn render_messages(
        &mut self,
        doc: &mut Document,
        messages: &[MessageRecord],
        labels: &[String],
    ) -> Result<(), DomError> {
        let list = self.message_list;
        let texts = messages.iter().map(|m| m.text.as_str());
        sync_items(doc, list, &mut self.message_items, texts, labels)?;
        for (item, message) in self.message_items.iter().zip(messages) {
            doc.set_attribute(*item, "tabindex", "0")?;
            doc.set_attribute(*item, "aria-description", &message_description(message))?;
        }
        Ok(())
    }

    /// Sync the caption list with the transcript
    pub fn render_transcript(&mut self, doc: &mut Document, transcript: &[TranscriptEntry]) -> Result<(), DomError> {
        let lines: Vec<String> = transcript.iter().map(|t| format!("{}: {}", t.speaker_name, t.text)).collect();
        let labels: Vec<String> = transcript
            .iter()
            .map(|t| if t.is_final { t.speaker_name.clone() } else { format!("{} (speaking)", t.speaker_name) })
            .collect();
        let list = self.transcript;
        sync_items(doc, list, &mut self.transcript_items, lines.iter().map(String::as_str), &labels)
    }

    /// Refresh names and pressed state of the toggle buttons
    pub fn render_controls(&self, doc: &mut Document, state: ControlState) -> Result<(), DomError> {
        for (control, node) in &self.buttons {
            let on = state.get(*control);
            doc.set_attribute(*node, "aria-label", control.label(on))?;
            if control.toggles() {
                doc.set_attribute(*node, "aria-pressed", if on { "true" } else { "false" })?;
            }
        }
        Ok(())
    }

    /// Mount the call settings dialog. Returns the existing one if open.
    pub fn open_settings(&mut self, doc: &mut Document) -> Result<NodeId, DomError> {
        if let Some(dialog) = self.settings.filter(|d| doc.is_connected(*d)) {
            return Ok(dialog);
        }

        let body = doc.body();
        let dialog = doc.append_element(body, "div")?;
        doc.set_attribute(dialog, "role", "dialog")?;
        doc.set_attribute(dialog, "aria-label", "Call settings")?;
        doc.set_attribute(dialog, "aria-modal", "true")?;

        let close = doc.append_element(dialog, "button")?;
        doc.set_attribute(close, "aria-label", "Close settings")?;

        let heading = doc.append_element(dialog, "h2")?;
        doc.set_text_content(heading, "Device Settings")?;

        for (id, label) in [
            ("camera-select", "Camera"),
            ("microphone-select", "Microphone"),
            ("speaker-select", "Speaker"),
        ] {
            let section = doc.append_element(dialog, "div")?;
            let caption = doc.append_element(section, "label")?;
            doc.set_attribute(caption, "for", id)?;
            doc.set_text_content(caption, label)?;
            let select = doc.append_element(section, "select")?;
            doc.set_attribute(select, "id", id)?;
            let option = doc.append_element(select, "option")?;
            doc.set_text_content(option, &format!("Default {label}"))?;
        }

        self.settings = Some(dialog);
        Ok(dialog)
    }

    /// Remove the settings dialog. Returns false if none was open.
    pub fn close_settings(&mut self, doc: &mut Document) -> bool {
        match self.settings.take() {
            Some(dialog) => {
                doc.remove(dialog);
                true
            }
            None => false,
        }
    }
}

/// Message body as a screen reader should hear it: emoji by name, then
/// each attachment
fn message_description(message: &MessageRecord) -> String {
    let mut parts = Vec::with_capacity(message.attachments.len() + 1);
    if !message.text.is_empty() {
        parts.push(spoken_text(&message.text));
    }
    parts.extend(message.attachments.iter().map(attachment_description));
    parts.join(". ")
}

/// Make `items` mirror `texts` one `<li>` per entry, reusing nodes by
/// position and dropping the surplus.
fn sync_items<'a>(
    doc: &mut Document,
    list: NodeId,
    items: &mut Vec<NodeId>,
    texts: impl Iterator<Item = &'a str>,
    labels: &[String],
) -> Result<(), DomError> {
    let mut count = 0;
    for (index, text) in texts.enumerate() {
        let item = match items.get(index) {
            Some(&item) => item,
            None => {
                let item = doc.append_element(list, "li")?;
                items.push(item);
                item
            }
        };
        doc.set_text_content(item, text)?;
        match labels.get(index) {
            Some(label) => doc.set_attribute(item, "aria-label", label)?,
            None => doc.remove_attribute(item, "aria-label")?,
        }
        count += 1;
    }
    for stale in items.drain(count..) {
        doc.remove(stale);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, text: &str) -> MessageRecord {
        MessageRecord { id: id.into(), author_name: Some("Ann".into()), text: text.into(), ..Default::default() }
    }

    #[test]
    fn test_layout() {
        let mut doc = Document::new();
        let view = OverlayView::build(&mut doc).unwrap();

        assert_eq!(doc.attribute(view.message_list(), "role"), Some("log"));
        assert_eq!(doc.attribute(view.toolbar(), "role"), Some("toolbar"));
        assert_eq!(view.control_nodes().len(), 5);
        assert_eq!(doc.tabbable_descendants(view.toolbar()), view.control_nodes());
        assert_eq!(view.control_at(4), Some(Control::Leave));
        assert!(doc.is_focusable(view.composer()));
    }

    #[test]
    fn test_render_reuses_nodes() {
        let mut doc = Document::new();
        let mut view = OverlayView::build(&mut doc).unwrap();
        let labels = vec!["message from Ann".to_string(), "message from Ann".to_string()];

        view.render_messages(&mut doc, &[record("1", "hi"), record("2", "there")], &labels).unwrap();
        let first = view.message_nodes()[0];
        doc.focus(first);

        view.render_messages(&mut doc, &[record("1", "hi (edited)")], &labels[..1]).unwrap();
        assert_eq!(view.message_nodes(), &[first]);
        assert_eq!(doc.text_content(first), "hi (edited)");
        assert_eq!(doc.active_element(), Some(first));
        assert!(doc.is_focusable(first));
    }

    #[test]
    fn test_message_description() {
        let mut doc = Document::new();
        let mut view = OverlayView::build(&mut doc).unwrap();
        let mut message = record("1", "ship it 👍");
        message.attachments.push(fos_chat::Attachment {
            kind: fos_chat::AttachmentKind::File,
            title: Some("notes.pdf".into()),
            file_size: Some(1536),
            ..Default::default()
        });

        view.render_messages(&mut doc, &[message], &["message from Ann".to_string()]).unwrap();
        let item = view.message_nodes()[0];
        assert_eq!(
            doc.attribute(item, "aria-description"),
            Some("ship it thumbs up. File: notes.pdf (1.5 KB)")
        );
    }

    #[test]
    fn test_controls_reflect_state() {
        let mut doc = Document::new();
        let view = OverlayView::build(&mut doc).unwrap();
        view.render_controls(&mut doc, ControlState { microphone: true, ..Default::default() }).unwrap();

        let mic = view.control_node(Control::Microphone).unwrap();
        let cam = view.control_node(Control::Camera).unwrap();
        assert_eq!(doc.attribute(mic, "aria-label"), Some("Turn off microphone"));
        assert_eq!(doc.attribute(mic, "aria-pressed"), Some("true"));
        assert_eq!(doc.attribute(cam, "aria-label"), Some("Turn on camera"));
        let leave = view.control_node(Control::Leave).unwrap();
        assert_eq!(doc.attribute(leave, "aria-pressed"), None);
    }

    #[test]
    fn test_settings_dialog_lifecycle() {
        let mut doc = Document::new();
        let mut view = OverlayView::build(&mut doc).unwrap();

        let dialog = view.open_settings(&mut doc).unwrap();
        assert_eq!(view.open_settings(&mut doc).unwrap(), dialog);
        assert_eq!(doc.attribute(dialog, "aria-modal"), Some("true"));
        // Close button plus three selects
        assert_eq!(doc.tabbable_descendants(dialog).len(), 4);

        assert!(view.close_settings(&mut doc));
        assert!(!doc.is_connected(dialog));
        assert!(!view.close_settings(&mut doc));
    }
}
