//! Scripted replay
//!
//! Drives an [`Overlay`] over the in-memory transports from a JSON script
//! and records every live region write with the time it landed. Used by
//! the `fos-overlay replay` command for accessibility QA.
//!
//! ```json
//! {
//!   "user_id": "me",
//!   "channel": "general",
//!   "call": "standup",
//!   "steps": [
//!     { "action": "chat", "event": { "type": "message_new", "channel": "general",
//!       "message": { "id": "1", "author_name": "Ann", "text": "hi" } } },
//!     { "action": "control", "control": "captions" },
//!     { "action": "advance", "ms": 1000 }
//!   ]
//! }
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use fos_a11y::{Clock, DocumentHost, KeyboardShortcut, LiveRegionHost, ManualClock, PlatformError, Politeness, RegionHandle, Setting};
use fos_chat::{ChannelId, ChatEvent, FileUpload, MemoryChatTransport, MessageRecord};
use fos_meeting::{CallId, MemoryVideoTransport, Participant, VideoEvent, VideoOp};
use serde::Deserialize;

use crate::config::OverlayConfig;
use crate::overlay::Overlay;
use crate::view::Control;
use crate::OverlayError;

fn default_step_ms() -> u64 {
    100
}

/// Replay script
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Local user; messages from this id are not announced
    #[serde(default)]
    pub user_id: Option<String>,
    /// Channel opened before the first step
    #[serde(default)]
    pub channel: Option<ChannelId>,
    /// Call joined before the first step
    #[serde(default)]
    pub call: Option<CallId>,
    /// History already in `channel`
    #[serde(default)]
    pub history: Vec<MessageRecord>,
    /// People already in `call`
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Transcription already running in `call`
    #[serde(default)]
    pub transcribing: bool,
    /// Clock advance after each step
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, OverlayError> {
        serde_json::from_str(json).map_err(OverlayError::Script)
    }
}

/// Where a `focus` step puts focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusTarget {
    Composer,
    Message(usize),
    Control(Control),
}

/// Transport operation a `fail` step switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailTarget {
    Query,
    Send,
    Upload,
    Join,
    Leave,
    Camera,
    Microphone,
    StartCaptions,
    StopCaptions,
}

/// One scripted action
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Server-side chat event
    Chat { event: ChatEvent },
    /// Server-side call event
    Video { event: VideoEvent },
    Typing { users: Vec<String> },
    OpenChannel { channel: ChannelId },
    CloseChannel,
    Join { call: CallId },
    Leave,
    /// Replace the draft text
    Type { text: String },
    Attach { files: Vec<FileUpload> },
    Send,
    Control { control: Control },
    Focus { target: FocusTarget },
    Key {
        key: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        alt: bool,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        meta: bool,
    },
    Preference { setting: Setting, value: bool },
    Fail {
        target: FailTarget,
        #[serde(default = "yes")]
        fail: bool,
    },
    Advance { ms: u64 },
}

fn yes() -> bool {
    true
}

/// A live region write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenLine {
    pub at_ms: u64,
    pub politeness: Politeness,
    pub text: String,
}

impl fmt::Display for SpokenLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>7}ms  {:<9}  {}", self.at_ms, self.politeness.as_str(), self.text)
    }
}

/// Host wrapper that records non-empty writes
struct EchoHost {
    inner: Box<dyn LiveRegionHost>,
    clock: Rc<dyn Clock>,
    regions: HashMap<RegionHandle, Politeness>,
    lines: Rc<RefCell<Vec<SpokenLine>>>,
}

impl LiveRegionHost for EchoHost {
    fn mount(&mut self, politeness: Politeness) -> Result<RegionHandle, PlatformError> {
        let handle = self.inner.mount(politeness)?;
        self.regions.insert(handle, politeness);
        Ok(handle)
    }

    fn write(&mut self, region: RegionHandle, text: &str) -> Result<(), PlatformError> {
        self.inner.write(region, text)?;
        if let (false, Some(&politeness)) = (text.is_empty(), self.regions.get(&region)) {
            self.lines.borrow_mut().push(SpokenLine {
                at_ms: self.clock.now_ms(),
                politeness,
                text: text.to_string(),
            });
        }
        Ok(())
    }

    fn unmount(&mut self, region: RegionHandle) {
        self.regions.remove(&region);
        self.inner.unmount(region);
    }

    fn platform_name(&self) -> &'static str {
        self.inner.platform_name()
    }
}

/// Replay session over in-memory transports
#[derive(Debug)]
pub struct Replay {
    overlay: Overlay<MemoryChatTransport, MemoryVideoTransport>,
    chat: Rc<MemoryChatTransport>,
    video: Rc<MemoryVideoTransport>,
    clock: ManualClock,
    spoken: Rc<RefCell<Vec<SpokenLine>>>,
}

impl Replay {
    /// Build the overlay and seed the transports from the script header
    pub fn new(config: &OverlayConfig, script: &Script) -> Result<Self, OverlayError> {
        let clock = ManualClock::new();
        let chat = Rc::new(MemoryChatTransport::new(script.user_id.as_deref()));
        let video = Rc::new(MemoryVideoTransport::new());
        if let Some(channel) = &script.channel {
            for message in &script.history {
                chat.seed(channel, message.clone());
            }
        }
        video.set_participants(script.participants.clone());
        video.set_transcribing(script.transcribing);

        let spoken = Rc::new(RefCell::new(Vec::new()));
        let lines = spoken.clone();
        let echo_clock: Rc<dyn Clock> = Rc::new(clock.clone());
        let overlay = Overlay::with_host(config, chat.clone(), video.clone(), Rc::new(clock.clone()), move |doc| {
            Box::new(EchoHost {
                inner: Box::new(DocumentHost::new(doc)),
                clock: echo_clock,
                regions: HashMap::new(),
                lines,
            })
        })?;

        Ok(Self { overlay, chat, video, clock, spoken })
    }

    pub fn overlay(&self) -> &Overlay<MemoryChatTransport, MemoryVideoTransport> {
        &self.overlay
    }

    pub fn chat_transport(&self) -> &MemoryChatTransport {
        &self.chat
    }

    pub fn video_transport(&self) -> &MemoryVideoTransport {
        &self.video
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Every write so far, oldest first
    pub fn spoken(&self) -> Vec<SpokenLine> {
        self.spoken.borrow().clone()
    }

    /// Run the script to completion and let every pending announcement
    /// land. Failing steps are logged and skipped.
    pub async fn run(&mut self, script: &Script) -> Vec<SpokenLine> {
        if let Some(channel) = &script.channel {
            if let Err(e) = self.overlay.open_channel(channel.clone()).await {
                tracing::warn!(%channel, error = %e, "could not open channel");
            }
        }
        if let Some(call) = &script.call {
            if let Err(e) = self.overlay.join(call.clone()).await {
                tracing::warn!(%call, error = %e, "could not join call");
            }
        }
        self.advance(script.step_ms);

        for (index, step) in script.steps.iter().enumerate() {
            if let Err(e) = self.apply(step).await {
                tracing::warn!(step = index, error = %e, "step failed");
            }
            self.advance(script.step_ms);
        }
        self.drain();
        self.spoken()
    }

    /// Perform one step without advancing the clock
    pub async fn apply(&mut self, step: &Step) -> Result<(), OverlayError> {
        tracing::debug!(?step, at_ms = self.clock.now_ms(), "replay step");
        match step {
            Step::Chat { event } => {
                if !self.chat.publish(event) {
                    tracing::debug!(channel = %event.channel(), "chat event has no subscriber");
                }
                self.overlay.handle_chat_event(event);
            }
            Step::Video { event } => {
                if !self.video.publish(event) {
                    tracing::debug!(call = %event.call(), "video event has no subscriber");
                }
                self.overlay.handle_video_event(event);
            }
            Step::Typing { users } => self.overlay.set_typing(users.clone()),
            Step::OpenChannel { channel } => self.overlay.open_channel(channel.clone()).await?,
            Step::CloseChannel => self.overlay.close_channel(),
            Step::Join { call } => self.overlay.join(call.clone()).await?,
            Step::Leave => self.overlay.leave().await?,
            Step::Type { text } => self.overlay.type_text(text),
            Step::Attach { files } => {
                self.overlay.attach_files(files.clone());
            }
            Step::Send => {
                self.overlay.send_message().await?;
            }
            Step::Control { control } => self.overlay.activate_control(*control).await?,
            Step::Focus { target } => self.focus(*target),
            Step::Key { key, ctrl, alt, shift, meta } => {
                let shortcut = KeyboardShortcut {
                    key: key.clone(),
                    ctrl: *ctrl,
                    alt: *alt,
                    shift: *shift,
                    meta: *meta,
                };
                let consumed = self.overlay.key_down(&shortcut).await?;
                tracing::debug!(key = %shortcut.display(), consumed, "key pressed");
            }
            Step::Preference { setting, value } => self.overlay.set_preference(*setting, *value),
            Step::Fail { target, fail } => self.fail(*target, *fail),
            Step::Advance { ms } => self.advance(*ms),
        }
        Ok(())
    }

    fn focus(&mut self, target: FocusTarget) {
        let view = self.overlay.view();
        let node = match target {
            FocusTarget::Composer => Some(view.composer()),
            FocusTarget::Message(index) => view.message_nodes().get(index).copied(),
            FocusTarget::Control(control) => view.control_node(control),
        };
        match node {
            Some(node) => {
                self.overlay.click(node);
            }
            None => tracing::warn!(?target, "focus target not rendered"),
        }
    }

    fn fail(&self, target: FailTarget, fail: bool) {
        match target {
            FailTarget::Query => self.chat.fail_queries(fail),
            FailTarget::Send => self.chat.fail_sends(fail),
            FailTarget::Upload => self.chat.fail_uploads(fail),
            FailTarget::Join => self.video.fail(VideoOp::Join, fail),
            FailTarget::Leave => self.video.fail(VideoOp::Leave, fail),
            FailTarget::Camera => self.video.fail(VideoOp::Camera, fail),
            FailTarget::Microphone => self.video.fail(VideoOp::Microphone, fail),
            FailTarget::StartCaptions => self.video.fail(VideoOp::StartCaptions, fail),
            FailTarget::StopCaptions => self.video.fail(VideoOp::StopCaptions, fail),
        }
    }

    /// Move the clock forward, firing every timer that falls due on the way
    pub fn advance(&mut self, ms: u64) {
        let target = self.clock.now_ms() + ms;
        while let Some(deadline) = self.overlay.next_deadline() {
            if deadline > target {
                break;
            }
            self.clock.set(deadline.max(self.clock.now_ms()));
            self.overlay.poll();
            if self.overlay.next_deadline() == Some(deadline) {
                // Host made no progress; try again on the next advance
                break;
            }
        }
        self.clock.set(target);
        self.overlay.poll();
    }

    /// Run timers until nothing is pending
    pub fn drain(&mut self) {
        while let Some(deadline) = self.overlay.next_deadline() {
            let now = self.clock.now_ms();
            self.advance(deadline.saturating_sub(now));
            if self.overlay.next_deadline() == Some(deadline) {
                break;
            }
        }
    }
}

/// Replay `script` with `config` and return every live region write
pub async fn replay(config: &OverlayConfig, script: &Script) -> Result<Vec<SpokenLine>, OverlayError> {
    let mut session = Replay::new(config, script)?;
    let spoken = session.run(script).await;
    session.overlay.shutdown().await;
    Ok(spoken)
}
