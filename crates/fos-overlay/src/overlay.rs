//! Overlay - composition root
//!
//! Owns the headless document and wires the announcer, focus manager,
//! navigation controllers, chat bridge, composer and call controller
//! together. Keyboard input is routed by where focus currently is:
//! an open dialog first, then the composer, the message log and the call
//! toolbar.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use fos_a11y::{
    AccessibilitySettings, Announcer, Clock, DocumentHost, FocusManager, FocusTrap, KeyboardNavigationController,
    KeyboardShortcut, LiveRegionHost, MediaFeatures, NavAction, NavItems, Orientation, Politeness, Setting,
};
use fos_chat::{
    ChannelId, ChatError, ChatEvent, ChatTransport, FileUpload, MessageAccessibilityBridge, MessageComposer,
    MessageRecord,
};
use fos_dom::{Document, DomError, NodeId};
use fos_meeting::{CallController, CallId, CaptionStateMachine, CaptionStatus, VideoEvent, VideoTransport};

use crate::config::OverlayConfig;
use crate::view::{Control, ControlState, OverlayView};
use crate::OverlayError;

/// Accessible chat and meeting overlay
#[derive(Debug)]
pub struct Overlay<C: ChatTransport, V: VideoTransport> {
    doc: Rc<RefCell<Document>>,
    view: OverlayView,
    announcer: Announcer,
    focus: FocusManager,
    settings_trap: Option<FocusTrap>,
    message_nav: KeyboardNavigationController,
    toolbar_nav: KeyboardNavigationController,
    chat: MessageAccessibilityBridge<C>,
    composer: MessageComposer<C>,
    call: CallController<V>,
    preferences: AccessibilitySettings,
}

impl<C: ChatTransport, V: VideoTransport> Overlay<C, V> {
    /// Create an overlay whose live regions render into its own document
    pub fn new(config: &OverlayConfig, chat: Rc<C>, video: Rc<V>, clock: Rc<dyn Clock>) -> Result<Self, OverlayError> {
        Self::with_host(config, chat, video, clock, |doc| Box::new(DocumentHost::new(doc)))
    }

    /// Create an overlay with a custom live region host built over the
    /// overlay's document
    pub fn with_host<F>(
        config: &OverlayConfig,
        chat: Rc<C>,
        video: Rc<V>,
        clock: Rc<dyn Clock>,
        host: F,
    ) -> Result<Self, OverlayError>
    where
        F: FnOnce(Rc<RefCell<Document>>) -> Box<dyn LiveRegionHost>,
    {
        let doc = Rc::new(RefCell::new(Document::new()));
        let view = OverlayView::build(&mut doc.borrow_mut())?;

        let announcer = Announcer::new(config.announcer.clone(), clock.clone());
        announcer.init(host(doc.clone()));

        let captions = CaptionStateMachine::new(config.captions.clone(), announcer.clone(), clock);
        let preferences = AccessibilitySettings::detect(&config.media);
        tracing::info!(?preferences, "overlay initialized");

        Ok(Self {
            view,
            focus: FocusManager::new(),
            settings_trap: None,
            message_nav: KeyboardNavigationController::new(Orientation::Vertical, announcer.clone()),
            toolbar_nav: KeyboardNavigationController::new(Orientation::Horizontal, announcer.clone()),
            chat: MessageAccessibilityBridge::new(chat.clone(), announcer.clone(), config.chat.clone()),
            composer: MessageComposer::new(chat, announcer.clone(), config.chat.clone()),
            call: CallController::new(video, announcer.clone(), config.call.clone(), captions),
            preferences,
            announcer,
            doc,
        })
    }

    pub fn document(&self) -> Ref<'_, Document> {
        self.doc.borrow()
    }

    pub fn view(&self) -> &OverlayView {
        &self.view
    }

    pub fn announcer(&self) -> &Announcer {
        &self.announcer
    }

    pub fn chat(&self) -> &MessageAccessibilityBridge<C> {
        &self.chat
    }

    pub fn composer(&self) -> &MessageComposer<C> {
        &self.composer
    }

    pub fn call(&self) -> &CallController<V> {
        &self.call
    }

    pub fn message_selection(&self) -> isize {
        self.message_nav.selected_index()
    }

    pub fn preferences(&self) -> &AccessibilitySettings {
        &self.preferences
    }

    /// Re-detect preferences after the environment changed
    pub fn media_changed(&mut self, features: &MediaFeatures) {
        self.preferences.refresh(features);
    }

    pub fn set_preference(&mut self, setting: Setting, value: bool) {
        self.preferences.update(setting, value);
    }

    // Rendering

    fn control_state(&self) -> ControlState {
        ControlState {
            microphone: self.call.microphone_enabled(),
            camera: self.call.camera_enabled(),
            captions: matches!(self.call.captions().status(), CaptionStatus::Active | CaptionStatus::Starting),
        }
    }

    /// Push the read models into the document. Document failures are
    /// logged and otherwise ignored.
    fn render(&mut self) {
        if let Err(e) = self.try_render() {
            tracing::warn!(error = %e, "overlay render failed");
        }
    }

    fn try_render(&mut self) -> Result<(), DomError> {
        let state = self.control_state();
        let labels = self.chat.labels();
        let mut doc = self.doc.borrow_mut();
        self.view.render_messages(&mut doc, self.chat.messages(), &labels)?;
        self.view.render_transcript(&mut doc, self.call.captions().transcript())?;
        self.view.render_controls(&mut doc, state)
    }

    // Chat

    /// Make `channel` the active chat channel
    pub async fn open_channel(&mut self, channel: ChannelId) -> Result<(), OverlayError> {
        if self.chat.active_channel() != Some(&channel) {
            self.message_nav.reset();
        }
        let result = self.chat.switch_to(channel).await;
        self.render();
        Ok(result?)
    }

    pub fn close_channel(&mut self) {
        self.chat.detach();
        self.message_nav.reset();
        self.render();
    }

    /// Route a chat transport event. Returns false if it was ignored.
    pub fn handle_chat_event(&mut self, event: &ChatEvent) -> bool {
        let handled = self.chat.handle_event(event);
        if handled {
            self.render();
        }
        handled
    }

    pub fn set_typing(&mut self, users: Vec<String>) {
        self.chat.set_typing(users);
    }

    /// Replace the draft text
    pub fn type_text(&mut self, text: &str) {
        self.composer.set_text(text);
        self.sync_composer();
    }

    pub fn attach_files(&mut self, files: Vec<FileUpload>) -> usize {
        self.composer.add_files(files)
    }

    fn sync_composer(&mut self) {
        let node = self.view.composer();
        if let Err(e) = self.doc.borrow_mut().set_text_content(node, self.composer.text()) {
            tracing::warn!(error = %e, "composer render failed");
        }
    }

    /// Send the draft to the active channel
    pub async fn send_message(&mut self) -> Result<MessageRecord, OverlayError> {
        let Some(channel) = self.chat.active_channel().cloned() else {
            let e = ChatError::NoActiveChannel;
            self.announcer.announce(&e.to_string(), Politeness::Assertive);
            return Err(e.into());
        };
        let result = self.composer.send(&channel).await;
        self.sync_composer();
        let message = result?;

        // Show our own message before the transport echoes it back; the
        // echo merges by id
        let echo = ChatEvent::MessageNew { channel, message: message.clone() };
        self.handle_chat_event(&echo);
        Ok(message)
    }

    fn clear_draft(&mut self) {
        self.composer.clear();
        self.sync_composer();
    }

    // Call

    pub async fn join(&mut self, call: CallId) -> Result<(), OverlayError> {
        let result = self.call.join(call).await;
        self.toolbar_nav.reset();
        self.render();
        Ok(result?)
    }

    pub async fn leave(&mut self) -> Result<(), OverlayError> {
        let result = self.call.leave().await;
        self.render();
        Ok(result?)
    }

    /// Route a video transport event. Returns false if it was ignored.
    pub fn handle_video_event(&mut self, event: &VideoEvent) -> bool {
        let handled = self.call.handle_event(event);
        if handled {
            self.render();
        }
        handled
    }

    /// Run the action behind a toolbar button
    pub async fn activate_control(&mut self, control: Control) -> Result<(), OverlayError> {
        tracing::debug!(?control, "control activated");
        match control {
            Control::Microphone => {
                self.call.toggle_microphone().await;
            }
            Control::Camera => {
                self.call.toggle_camera().await;
            }
            Control::Captions => self.call.toggle_captions().await,
            Control::Settings => self.open_settings(),
            Control::Leave => self.leave().await?,
        }
        self.render();
        Ok(())
    }

    // Settings dialog

    /// Open the settings dialog and trap focus inside it
    pub fn open_settings(&mut self) {
        if self.settings_trap.is_some() {
            return;
        }
        let mut doc = self.doc.borrow_mut();
        let dialog = match self.view.open_settings(&mut doc) {
            Ok(dialog) => dialog,
            Err(e) => {
                tracing::warn!(error = %e, "could not open settings");
                return;
            }
        };
        self.focus.save_focus(&doc);
        self.settings_trap = Some(self.focus.trap_focus(&mut doc, dialog));
    }

    /// Close the settings dialog and put focus back. Returns false if it
    /// was not open.
    pub fn close_settings(&mut self) -> bool {
        let Some(trap) = self.settings_trap.take() else { return false };
        self.focus.release(trap);
        let mut doc = self.doc.borrow_mut();
        self.view.close_settings(&mut doc);
        self.focus.restore_focus(&mut doc);
        true
    }

    pub fn settings_open(&self) -> bool {
        self.settings_trap.is_some()
    }

    // Keyboard

    /// Focus a node the way a pointer click would
    pub fn click(&mut self, node: NodeId) -> bool {
        self.focus.manage_focus(&mut self.doc.borrow_mut(), Some(node))
    }

    /// Route a keydown by focus location. Returns true if consumed.
    pub async fn key_down(&mut self, key: &KeyboardShortcut) -> Result<bool, OverlayError> {
        if self.settings_trap.is_some() {
            if key.key == "Escape" {
                return Ok(self.close_settings());
            }
            return Ok(self.focus.handle_key_down(&mut self.doc.borrow_mut(), key));
        }

        let Some(active) = self.doc.borrow().active_element() else { return Ok(false) };
        if active == self.view.composer() {
            return self.composer_key(key).await;
        }
        if let Some(index) = self.view.message_nodes().iter().position(|n| *n == active) {
            return Ok(self.message_key(index, key));
        }
        if let Some(index) = self.view.control_nodes().iter().position(|n| *n == active) {
            return self.toolbar_key(index, key).await;
        }
        Ok(false)
    }

    async fn composer_key(&mut self, key: &KeyboardShortcut) -> Result<bool, OverlayError> {
        match key.key.as_str() {
            "Enter" if !key.shift => {
                self.send_message().await?;
                Ok(true)
            }
            "Escape" => {
                self.clear_draft();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn message_key(&mut self, focused: usize, key: &KeyboardShortcut) -> bool {
        let labels = self.chat.labels();
        let nodes = self.view.message_nodes().to_vec();
        let items = NavItems::new(&nodes, &labels);
        let mut doc = self.doc.borrow_mut();
        if self.message_nav.selected_index() != focused as isize {
            self.message_nav.select(&mut doc, &items, focused);
        }
        self.message_nav.handle_key(&mut doc, &items, key)
    }

    async fn toolbar_key(&mut self, focused: usize, key: &KeyboardShortcut) -> Result<bool, OverlayError> {
        let nodes = self.view.control_nodes();
        let labels: Vec<String> = {
            let doc = self.doc.borrow();
            nodes.iter().map(|n| doc.attribute(*n, "aria-label").unwrap_or_default().to_string()).collect()
        };
        let items = NavItems::new(&nodes, &labels);
        if self.toolbar_nav.selected_index() != focused as isize {
            self.toolbar_nav.select(&mut self.doc.borrow_mut(), &items, focused);
        }

        if NavAction::from_key(key, self.toolbar_nav.orientation()) == Some(NavAction::Activate) {
            let Some(control) = self.view.control_at(focused) else { return Ok(false) };
            self.activate_control(control).await?;
            return Ok(true);
        }
        Ok(self.toolbar_nav.handle_key(&mut self.doc.borrow_mut(), &items, key))
    }

    // Timers

    /// Run due announcer and caption timers
    pub fn poll(&mut self) {
        self.announcer.poll();
        let before = self.call.captions().status();
        self.call.poll();
        if self.call.captions().status() != before {
            self.render();
        }
    }

    /// Earliest time `poll` has work to do
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.announcer.next_deadline(), self.call.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Leave the call, detach from chat and remove the live regions
    pub async fn shutdown(&mut self) {
        if self.call.call().is_some() {
            if let Err(e) = self.call.leave().await {
                tracing::warn!(error = %e, "error leaving call during shutdown");
            }
        }
        self.close_settings();
        self.chat.detach();
        self.announcer.cleanup();
        tracing::info!("overlay shut down");
    }
}
