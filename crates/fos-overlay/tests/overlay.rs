//! Overlay integration tests
//!
//! The full stack over in-memory transports, driven through the document
//! and the keyboard the way a screen reader user would.

use std::rc::Rc;

use fos_a11y::{KeyboardShortcut, ManualClock, Politeness, Setting};
use fos_chat::{ChannelId, ChatError, ChatEvent, MemoryChatTransport, MessageRecord};
use fos_dom::{Document, NodeId};
use fos_meeting::{CallId, CaptionEvent, CaptionStatus, MemoryVideoTransport, Participant, VideoEvent, VideoOp};
use fos_overlay::{Control, Overlay, OverlayConfig, OverlayError};

struct Fixture {
    overlay: Overlay<MemoryChatTransport, MemoryVideoTransport>,
    chat: Rc<MemoryChatTransport>,
    video: Rc<MemoryVideoTransport>,
    clock: ManualClock,
}

impl Fixture {
    fn new() -> Self {
        let mut config = OverlayConfig::default();
        config.call.device_enable_delay_ms = 0;
        let clock = ManualClock::new();
        let chat = Rc::new(MemoryChatTransport::new(Some("me")));
        let video = Rc::new(MemoryVideoTransport::new());
        let overlay = Overlay::new(&config, chat.clone(), video.clone(), Rc::new(clock.clone())).unwrap();
        Self { overlay, chat, video, clock }
    }

    fn settle(&mut self) {
        self.clock.advance(10);
        self.overlay.poll();
    }

    fn said(&self, politeness: Politeness) -> String {
        self.overlay.announcer().visible_text(politeness)
    }

    fn key(&mut self, key: KeyboardShortcut) -> bool {
        smol::block_on(self.overlay.key_down(&key)).unwrap()
    }

    fn with_history(self) -> Self {
        let general = ChannelId::from("general");
        for (id, author, at) in [("1", "Ann", 1), ("2", "Bo", 2), ("3", "Cy", 3)] {
            self.chat.seed(&general, message(id, author, &format!("hello from {author}"), at));
        }
        self
    }

    fn open_general(&mut self) {
        smol::block_on(self.overlay.open_channel(ChannelId::from("general"))).unwrap();
    }

    fn join(&mut self) {
        smol::block_on(self.overlay.join(CallId::from("standup"))).unwrap();
        self.settle();
    }

    fn control(&self, control: Control) -> NodeId {
        self.overlay.view().control_node(control).unwrap()
    }
}

fn message(id: &str, author: &str, text: &str, at: u64) -> MessageRecord {
    MessageRecord {
        id: id.into(),
        author_id: author.to_lowercase(),
        author_name: Some(author.into()),
        text: text.into(),
        created_at_ms: at,
        ..Default::default()
    }
}

fn live_region_count(doc: &Document) -> usize {
    doc.tree()
        .descendants(doc.body())
        .filter(|&n| doc.attribute(n, "aria-live").is_some())
        .count()
}

#[test]
fn test_history_renders_into_log() {
    let mut f = Fixture::new().with_history();
    f.open_general();

    let nodes = f.overlay.view().message_nodes().to_vec();
    assert_eq!(nodes.len(), 3);
    let doc = f.overlay.document();
    assert_eq!(doc.text_content(nodes[1]), "hello from Bo");
    assert_eq!(doc.attribute(nodes[1], "aria-label"), Some("message from Bo"));
    assert!(doc.is_focusable(nodes[2]));
}

#[test]
fn test_arrow_keys_walk_messages() {
    let mut f = Fixture::new().with_history();
    f.open_general();
    let nodes = f.overlay.view().message_nodes().to_vec();

    assert!(f.overlay.click(nodes[0]));
    assert!(f.key(KeyboardShortcut::new("ArrowDown")));
    assert_eq!(f.overlay.message_selection(), 1);
    assert_eq!(f.overlay.document().active_element(), Some(nodes[1]));

    assert!(f.key(KeyboardShortcut::new("End")));
    assert_eq!(f.overlay.document().active_element(), Some(nodes[2]));
    assert!(f.key(KeyboardShortcut::new("ArrowDown")));
    assert_eq!(f.overlay.message_selection(), 2);

    assert!(f.key(KeyboardShortcut::new("Enter")));
    f.settle();
    assert_eq!(f.said(Politeness::Polite), "Selected message from Cy");
}

#[test]
fn test_incoming_message_announced_and_rendered() {
    let mut f = Fixture::new();
    f.open_general();
    let event = ChatEvent::MessageNew {
        channel: ChannelId::from("general"),
        message: message("9", "Ann", "standup in 5", 10),
    };

    assert!(f.chat.publish(&event));
    assert!(f.overlay.handle_chat_event(&event));
    f.settle();

    assert_eq!(f.said(Politeness::Polite), "New message from Ann: standup in 5");
    assert_eq!(f.overlay.view().message_nodes().len(), 1);
}

#[test]
fn test_enter_in_composer_sends() {
    let mut f = Fixture::new();
    f.open_general();
    let composer = f.overlay.view().composer();

    f.overlay.click(composer);
    f.overlay.type_text("on my way");
    assert_eq!(f.overlay.document().text_content(composer), "on my way");
    assert!(f.key(KeyboardShortcut::new("Enter")));
    f.settle();

    assert_eq!(f.said(Politeness::Polite), "Message sent successfully");
    assert_eq!(f.overlay.composer().text(), "");
    assert_eq!(f.overlay.document().text_content(composer), "");
    assert_eq!(f.overlay.chat().messages().len(), 1);
    assert_eq!(f.overlay.chat().messages()[0].text, "on my way");
    assert_eq!(f.chat.sent().len(), 1);
}

#[test]
fn test_shift_enter_does_not_send() {
    let mut f = Fixture::new();
    f.open_general();
    f.overlay.click(f.overlay.view().composer());
    f.overlay.type_text("line one");

    assert!(!f.key(KeyboardShortcut::new("Enter").shift()));
    assert!(f.chat.sent().is_empty());
}

#[test]
fn test_escape_clears_draft() {
    let mut f = Fixture::new();
    f.open_general();
    f.overlay.click(f.overlay.view().composer());
    f.overlay.type_text("never mind");

    assert!(f.key(KeyboardShortcut::new("Escape")));
    f.settle();
    assert_eq!(f.overlay.composer().text(), "");
    assert_eq!(f.said(Politeness::Polite), "Message cleared");
}

#[test]
fn test_send_without_channel() {
    let mut f = Fixture::new();
    f.overlay.type_text("hello?");

    let err = smol::block_on(f.overlay.send_message()).unwrap_err();
    f.settle();
    assert!(matches!(err, OverlayError::Chat(ChatError::NoActiveChannel)));
    assert_eq!(f.said(Politeness::Assertive), "No active channel");
    assert!(f.chat.sent().is_empty());
}

#[test]
fn test_failed_send_keeps_draft() {
    let mut f = Fixture::new();
    f.open_general();
    f.chat.fail_sends(true);
    f.overlay.type_text("retry me");

    let err = smol::block_on(f.overlay.send_message()).unwrap_err();
    f.settle();
    assert!(matches!(err, OverlayError::Chat(ChatError::Transport(_))));
    assert_eq!(f.overlay.composer().text(), "retry me");
    assert_eq!(f.said(Politeness::Assertive), "Failed to send message");
}

#[test]
fn test_toolbar_arrow_and_activate() {
    let mut f = Fixture::new();
    f.join();
    let mic = f.control(Control::Microphone);
    let camera = f.control(Control::Camera);
    assert_eq!(f.overlay.document().attribute(camera, "aria-label"), Some("Turn off camera"));

    f.overlay.click(mic);
    assert!(f.key(KeyboardShortcut::new("ArrowRight")));
    assert_eq!(f.overlay.document().active_element(), Some(camera));
    // Vertical keys belong to lists, not the toolbar
    assert!(!f.key(KeyboardShortcut::new("ArrowDown")));

    assert!(f.key(KeyboardShortcut::new("Enter")));
    f.settle();
    assert!(!f.overlay.call().camera_enabled());
    assert_eq!(f.said(Politeness::Polite), "Camera turned off");
    let doc = f.overlay.document();
    assert_eq!(doc.attribute(camera, "aria-label"), Some("Turn on camera"));
    assert_eq!(doc.attribute(camera, "aria-pressed"), Some("false"));
}

#[test]
fn test_toolbar_clamps_at_ends() {
    let mut f = Fixture::new();
    f.join();
    let mic = f.control(Control::Microphone);
    let leave = f.control(Control::Leave);

    f.overlay.click(mic);
    assert!(f.key(KeyboardShortcut::new("ArrowLeft")));
    assert_eq!(f.overlay.document().active_element(), Some(mic));
    assert!(f.key(KeyboardShortcut::new("End")));
    assert_eq!(f.overlay.document().active_element(), Some(leave));
    assert!(f.key(KeyboardShortcut::new("ArrowRight")));
    assert_eq!(f.overlay.document().active_element(), Some(leave));
}

#[test]
fn test_settings_dialog_traps_and_restores_focus() {
    let mut f = Fixture::new();
    let settings = f.control(Control::Settings);
    f.overlay.click(settings);

    assert!(f.key(KeyboardShortcut::new("Enter")));
    assert!(f.overlay.settings_open());
    let dialog = f.overlay.view().settings_dialog().unwrap();
    let inside = f.overlay.document().tabbable_descendants(dialog);
    assert_eq!(f.overlay.document().active_element(), Some(inside[0]));

    assert!(f.key(KeyboardShortcut::new("Tab").shift()));
    assert_eq!(f.overlay.document().active_element(), inside.last().copied());
    assert!(f.key(KeyboardShortcut::new("Tab")));
    assert_eq!(f.overlay.document().active_element(), Some(inside[0]));

    assert!(f.key(KeyboardShortcut::new("Escape")));
    assert!(!f.overlay.settings_open());
    assert!(!f.overlay.document().is_connected(dialog));
    assert_eq!(f.overlay.document().active_element(), Some(settings));
}

#[test]
fn test_captions_through_toolbar() {
    let mut f = Fixture::new();
    f.video.set_participants(vec![Participant {
        user_id: "ann".into(),
        session_id: "s1".into(),
        name: Some("Ann".into()),
        is_local: false,
    }]);
    f.join();
    let call = CallId::from("standup");
    let captions = f.control(Control::Captions);

    smol::block_on(f.overlay.activate_control(Control::Captions)).unwrap();
    assert_eq!(f.overlay.call().captions().status(), CaptionStatus::Starting);
    assert_eq!(f.overlay.document().attribute(captions, "aria-pressed"), Some("true"));

    let started = VideoEvent::CaptionsStarted { call: call.clone() };
    f.video.publish(&started);
    assert!(f.overlay.handle_video_event(&started));
    f.settle();
    assert_eq!(f.said(Politeness::Polite), "Live captions started");

    let line = VideoEvent::Caption {
        call,
        caption: CaptionEvent {
            text: "ship it".into(),
            user_id: Some("ann".into()),
            is_final: true,
            ..Default::default()
        },
    };
    assert!(f.overlay.handle_video_event(&line));
    f.settle();
    assert_eq!(f.said(Politeness::Polite), "Ann: ship it");
    let items = f.overlay.view().transcript_nodes().to_vec();
    assert_eq!(items.len(), 1);
    assert_eq!(f.overlay.document().text_content(items[0]), "Ann: ship it");
}

#[test]
fn test_caption_error_resets_on_poll() {
    let mut f = Fixture::new();
    f.join();
    f.video.fail(VideoOp::StartCaptions, true);

    smol::block_on(f.overlay.activate_control(Control::Captions)).unwrap();
    assert_eq!(f.overlay.call().captions().status(), CaptionStatus::Error);
    f.settle();
    assert_eq!(f.said(Politeness::Assertive), "Failed to toggle captions");

    while let Some(deadline) = f.overlay.next_deadline() {
        f.clock.set(deadline);
        f.overlay.poll();
        if f.overlay.call().captions().status() == CaptionStatus::Idle {
            break;
        }
    }
    assert_eq!(f.overlay.call().captions().status(), CaptionStatus::Idle);
    let captions = f.control(Control::Captions);
    assert_eq!(f.overlay.document().attribute(captions, "aria-pressed"), Some("false"));
}

#[test]
fn test_leave_control() {
    let mut f = Fixture::new();
    f.join();

    smol::block_on(f.overlay.activate_control(Control::Leave)).unwrap();
    f.settle();
    assert!(f.overlay.call().call().is_none());
    assert_eq!(f.said(Politeness::Polite), "Successfully left the meeting");
    assert_eq!(f.video.handler_count(&CallId::from("standup")), 0);
}

#[test]
fn test_preferences() {
    let mut config = OverlayConfig::default();
    config.media.user_agent = "Mozilla/5.0 (Windows) JAWS/2024".into();
    config.media.pointer_fine = true;
    let clock = ManualClock::new();
    let mut overlay = Overlay::new(
        &config,
        Rc::new(MemoryChatTransport::new(None)),
        Rc::new(MemoryVideoTransport::new()),
        Rc::new(clock),
    )
    .unwrap();

    assert!(overlay.preferences().screen_reader_enabled);
    assert!(!overlay.preferences().keyboard_navigation);
    overlay.set_preference(Setting::HighContrast, true);
    assert!(overlay.preferences().high_contrast);

    overlay.media_changed(&config.media);
    assert!(!overlay.preferences().high_contrast);
}

#[test]
fn test_shutdown_removes_live_regions() {
    let mut f = Fixture::new();
    f.open_general();
    f.join();
    assert!(live_region_count(&f.overlay.document()) > 0);

    smol::block_on(f.overlay.shutdown());
    assert!(f.video.joined().is_none());
    assert_eq!(f.chat.handler_count(&ChannelId::from("general")), 0);
    assert_eq!(live_region_count(&f.overlay.document()), 0);
    assert!(!f.overlay.announcer().is_initialized());
}
