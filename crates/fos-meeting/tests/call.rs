//! Call controller tests

mod common;

use common::{caption, controller, participant, Speech};
use fos_a11y::Politeness;
use fos_meeting::{CallId, CaptionStatus, MeetingError, VideoEvent, VideoOp};

#[test]
fn test_join_subscribes_and_enables_devices() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    let id = CallId::from("standup");

    smol::block_on(call.join(id.clone())).unwrap();
    speech.settle();

    assert_eq!(call.call(), Some(&id));
    assert_eq!(transport.joined(), Some(id.clone()));
    assert_eq!(transport.handler_count(&id), 8);
    assert!(call.camera_enabled());
    assert!(call.microphone_enabled());
    assert_eq!(speech.spoken(Politeness::Polite), vec!["Successfully joined the meeting"]);
}

#[test]
fn test_join_failure_is_announced() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    let id = CallId::from("standup");
    transport.fail(VideoOp::Join, true);

    let err = smol::block_on(call.join(id.clone())).unwrap_err();
    speech.settle();

    assert!(matches!(err, MeetingError::Join(_)));
    assert!(call.call().is_none());
    assert_eq!(transport.handler_count(&id), 0);
    assert_eq!(speech.spoken(Politeness::Assertive), vec!["Failed to join meeting"]);
}

#[test]
fn test_device_failure_does_not_fail_join() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    transport.fail(VideoOp::Microphone, true);

    smol::block_on(call.join(CallId::from("standup"))).unwrap();
    speech.settle();

    assert!(call.camera_enabled());
    assert!(!call.microphone_enabled());
    assert_eq!(speech.spoken(Politeness::Assertive), vec!["Could not enable camera or microphone"]);
}

#[test]
fn test_join_adopts_running_transcription() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    transport.set_transcribing(true);
    transport.set_participants(vec![participant("u1", "s1", "Ann")]);

    smol::block_on(call.join(CallId::from("standup"))).unwrap();

    assert_eq!(call.captions().status(), CaptionStatus::Active);
    assert_eq!(call.captions().roster().len(), 1);
}

#[test]
fn test_joining_other_call_leaves_first() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    let a = CallId::from("a");
    let b = CallId::from("b");

    smol::block_on(call.join(a.clone())).unwrap();
    smol::block_on(call.join(b.clone())).unwrap();

    assert_eq!(transport.handler_count(&a), 0);
    assert_eq!(transport.handler_count(&b), 8);
    assert_eq!(transport.joined(), Some(b));
    assert!(transport.log().iter().any(|op| op == "Leave"));
}

#[test]
fn test_toggle_devices() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    smol::block_on(call.join(CallId::from("standup"))).unwrap();
    speech.settle();

    assert!(!smol::block_on(call.toggle_camera()));
    speech.settle();
    assert!(smol::block_on(call.toggle_camera()));
    speech.settle();

    transport.fail(VideoOp::Microphone, true);
    assert!(smol::block_on(call.toggle_microphone()));
    speech.settle();

    assert_eq!(
        speech.spoken(Politeness::Polite),
        vec!["Successfully joined the meeting", "Camera turned off", "Camera turned on"]
    );
    assert_eq!(speech.spoken(Politeness::Assertive), vec!["Failed to toggle microphone"]);
}

#[test]
fn test_toggle_captions_round_trip() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    let id = CallId::from("standup");
    smol::block_on(call.join(id.clone())).unwrap();
    speech.settle();

    smol::block_on(call.toggle_captions());
    assert_eq!(call.captions().status(), CaptionStatus::Starting);
    speech.settle();

    let started = VideoEvent::CaptionsStarted { call: id.clone() };
    assert!(transport.publish(&started));
    assert!(call.handle_event(&started));
    assert_eq!(call.captions().status(), CaptionStatus::Active);
    speech.settle();

    smol::block_on(call.toggle_captions());
    speech.settle();
    let stopped = VideoEvent::CaptionsStopped { call: id };
    transport.publish(&stopped);
    call.handle_event(&stopped);
    speech.settle();

    assert_eq!(call.captions().status(), CaptionStatus::Idle);
    assert_eq!(
        speech.spoken(Politeness::Polite),
        vec![
            "Successfully joined the meeting",
            "Starting live captions...",
            "Live captions started",
            "Stopping live captions...",
            "Live captions stopped",
        ]
    );
}

#[test]
fn test_rejected_caption_start_resets() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    smol::block_on(call.join(CallId::from("standup"))).unwrap();
    transport.fail(VideoOp::StartCaptions, true);

    smol::block_on(call.toggle_captions());
    speech.settle();
    assert_eq!(call.captions().status(), CaptionStatus::Error);
    assert_eq!(speech.spoken(Politeness::Assertive), vec!["Failed to toggle captions"]);

    let deadline = call.next_deadline().unwrap();
    speech.clock.set(deadline);
    call.poll();
    assert_eq!(call.captions().status(), CaptionStatus::Idle);
}

#[test]
fn test_toggle_captions_without_call() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);

    smol::block_on(call.toggle_captions());
    speech.settle();

    assert_eq!(call.captions().status(), CaptionStatus::Idle);
    assert!(transport.log().is_empty());
    assert_eq!(speech.spoken(Politeness::Assertive), vec!["No active call for captions"]);
}

#[test]
fn test_leave_clears_state() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    let id = CallId::from("standup");
    transport.set_transcribing(true);
    smol::block_on(call.join(id.clone())).unwrap();
    speech.settle();
    call.handle_event(&caption(&id, "u1", "bye", true));
    assert_eq!(call.captions().transcript().len(), 1);

    smol::block_on(call.leave()).unwrap();
    speech.settle();

    assert!(call.call().is_none());
    assert!(transport.joined().is_none());
    assert_eq!(transport.handler_count(&id), 0);
    assert!(!call.camera_enabled());
    assert!(!call.microphone_enabled());
    assert_eq!(call.captions().status(), CaptionStatus::Idle);
    assert!(call.captions().transcript().is_empty());
    assert!(transport.log().iter().any(|op| op == "StopCaptions"));
    assert_eq!(speech.spoken(Politeness::Polite).last().map(String::as_str), Some("Successfully left the meeting"));
}

#[test]
fn test_leave_tolerates_caption_stop_failure() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    transport.set_transcribing(true);
    smol::block_on(call.join(CallId::from("standup"))).unwrap();
    transport.fail(VideoOp::StopCaptions, true);

    assert!(smol::block_on(call.leave()).is_ok());
    assert!(transport.joined().is_none());
}

#[test]
fn test_leave_failure_still_drops_handlers() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    let id = CallId::from("standup");
    smol::block_on(call.join(id.clone())).unwrap();
    transport.fail(VideoOp::Leave, true);

    let err = smol::block_on(call.leave()).unwrap_err();
    speech.settle();

    assert!(matches!(err, MeetingError::Leave(_)));
    assert!(call.call().is_none());
    assert_eq!(transport.handler_count(&id), 0);
    assert_eq!(speech.spoken(Politeness::Assertive), vec!["Error leaving meeting"]);
}

#[test]
fn test_leave_without_call_is_noop() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);

    smol::block_on(call.leave()).unwrap();
    speech.settle();
    assert!(transport.log().is_empty());
    assert!(speech.spoken(Politeness::Polite).is_empty());
}

#[test]
fn test_events_for_other_call_ignored() {
    let speech = Speech::new();
    let (_transport, mut call) = controller(&speech);
    smol::block_on(call.join(CallId::from("standup"))).unwrap();

    let elsewhere = VideoEvent::CaptionsStarted { call: CallId::from("retro") };
    assert!(!call.handle_event(&elsewhere));
    assert_eq!(call.captions().status(), CaptionStatus::Idle);
}

#[test]
fn test_drop_unsubscribes() {
    let speech = Speech::new();
    let (transport, mut call) = controller(&speech);
    let id = CallId::from("standup");
    smol::block_on(call.join(id.clone())).unwrap();

    drop(call);
    assert_eq!(transport.handler_count(&id), 0);
}
