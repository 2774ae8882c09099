//! Call controller
//!
//! Join/leave, device toggles and caption toggling for one call at a time,
//! with the announcements that go with each.

use std::rc::Rc;
use std::time::Duration;

use fos_a11y::{Announcer, Politeness};
use serde::Deserialize;

use crate::captions::{CaptionCommand, CaptionStateMachine, CaptionStatus};
use crate::transport::{CallId, HandlerId, TransportError, VideoEvent, VideoEventKind, VideoTransport};
use crate::MeetingError;

/// Call configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CallConfig {
    /// Wait after joining before turning on camera and microphone
    pub device_enable_delay_ms: u64,
    /// Turn devices on after joining
    pub enable_devices_on_join: bool,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            device_enable_delay_ms: 500,
            enable_devices_on_join: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Device {
    Camera,
    Microphone,
}

impl Device {
    fn name(self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Microphone => "microphone",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::Microphone => "Microphone",
        }
    }
}

/// Controller for the current call
#[derive(Debug)]
pub struct CallController<V: VideoTransport> {
    transport: Rc<V>,
    announcer: Announcer,
    config: CallConfig,
    captions: CaptionStateMachine,
    call: Option<CallId>,
    handlers: Vec<(VideoEventKind, HandlerId)>,
}

impl<V: VideoTransport> CallController<V> {
    pub fn new(transport: Rc<V>, announcer: Announcer, config: CallConfig, captions: CaptionStateMachine) -> Self {
        Self {
            transport,
            announcer,
            config,
            captions,
            call: None,
            handlers: Vec::new(),
        }
    }

    pub fn call(&self) -> Option<&CallId> {
        self.call.as_ref()
    }

    pub fn captions(&self) -> &CaptionStateMachine {
        &self.captions
    }

    pub fn captions_mut(&mut self) -> &mut CaptionStateMachine {
        &mut self.captions
    }

    pub fn camera_enabled(&self) -> bool {
        self.transport.camera_enabled()
    }

    pub fn microphone_enabled(&self) -> bool {
        self.transport.microphone_enabled()
    }

    fn subscribe(&mut self, call: &CallId) {
        self.unsubscribe();
        for kind in VideoEventKind::ALL {
            let id = self.transport.on(call, kind);
            self.handlers.push((kind, id));
        }
    }

    fn unsubscribe(&mut self) {
        for (_, id) in self.handlers.drain(..) {
            self.transport.off(id);
        }
    }

    /// Join `call`, leaving any other call first.
    ///
    /// Join failures are announced and returned. Device failures after a
    /// successful join are announced but do not fail the join.
    pub async fn join(&mut self, call: CallId) -> Result<(), MeetingError> {
        if self.call.as_ref() == Some(&call) {
            tracing::trace!(%call, "already in call");
            return Ok(());
        }
        if self.call.is_some() {
            self.leave().await?;
        }

        if let Err(e) = self.transport.join(&call).await {
            tracing::error!(%call, error = %e, "failed to join meeting");
            self.announcer.announce("Failed to join meeting", Politeness::Assertive);
            return Err(MeetingError::Join(e));
        }

        self.subscribe(&call);
        self.captions.clear();
        self.captions.roster_mut().replace(self.transport.participants());
        if self.transport.is_transcribing() {
            self.captions.adopt_active();
        }
        tracing::info!(%call, participants = self.captions.roster().len(), "joined meeting");
        self.call = Some(call);
        self.announcer.announce("Successfully joined the meeting", Politeness::Polite);

        if self.config.enable_devices_on_join {
            smol::Timer::after(Duration::from_millis(self.config.device_enable_delay_ms)).await;
            self.enable_devices().await;
        }
        Ok(())
    }

    async fn enable_devices(&mut self) {
        let mut result = self.transport.enable_camera().await;
        if result.is_ok() {
            result = self.transport.enable_microphone().await;
        }
        if let Err(e) = result {
            tracing::warn!(error = %e, "could not enable devices");
            self.announcer.announce("Could not enable camera or microphone", Politeness::Assertive);
        }
    }

    /// Leave the current call. Doing so when not in a call is a no-op.
    ///
    /// Caption and device shutdown failures are tolerated. A failed leave
    /// is announced and returned, but local call state is dropped either
    /// way.
    pub async fn leave(&mut self) -> Result<(), MeetingError> {
        let Some(call) = self.call.take() else { return Ok(()) };

        if self.captions.status() == CaptionStatus::Active || self.transport.is_transcribing() {
            if let Err(e) = self.transport.stop_closed_captions().await {
                tracing::warn!(error = %e, "could not stop closed captions");
            }
        }
        if let Err(e) = self.disable_devices().await {
            tracing::warn!(error = %e, "error disabling devices");
        }

        let result = self.transport.leave().await;
        self.unsubscribe();
        self.captions.clear();

        match result {
            Ok(()) => {
                tracing::info!(%call, "left meeting");
                self.announcer.announce("Successfully left the meeting", Politeness::Polite);
                Ok(())
            }
            Err(e) => {
                tracing::error!(%call, error = %e, "error leaving meeting");
                self.announcer.announce("Error leaving meeting", Politeness::Assertive);
                Err(MeetingError::Leave(e))
            }
        }
    }

    async fn disable_devices(&self) -> Result<(), TransportError> {
        if self.transport.camera_enabled() {
            self.transport.disable_camera().await?;
        }
        if self.transport.microphone_enabled() {
            self.transport.disable_microphone().await?;
        }
        Ok(())
    }

    async fn toggle_device(&mut self, device: Device) -> bool {
        let (was_on, result) = match device {
            Device::Camera => {
                let on = self.transport.camera_enabled();
                (on, if on { self.transport.disable_camera().await } else { self.transport.enable_camera().await })
            }
            Device::Microphone => {
                let on = self.transport.microphone_enabled();
                (on, if on { self.transport.disable_microphone().await } else { self.transport.enable_microphone().await })
            }
        };
        match result {
            Ok(()) => {
                let state = if was_on { "off" } else { "on" };
                self.announcer.announce(&format!("{} turned {state}", device.label()), Politeness::Polite);
                !was_on
            }
            Err(e) => {
                tracing::error!(device = device.name(), error = %e, "failed to toggle device");
                self.announcer.announce(&format!("Failed to toggle {}", device.name()), Politeness::Assertive);
                was_on
            }
        }
    }

    /// Flip the camera. Returns whether it is now on.
    pub async fn toggle_camera(&mut self) -> bool {
        self.toggle_device(Device::Camera).await
    }

    /// Flip the microphone. Returns whether it is now on.
    pub async fn toggle_microphone(&mut self) -> bool {
        self.toggle_device(Device::Microphone).await
    }

    /// Flip live captions and run the resulting transport command
    pub async fn toggle_captions(&mut self) {
        if self.call.is_none() {
            self.announcer.announce("No active call for captions", Politeness::Assertive);
            return;
        }
        let Some(command) = self.captions.toggle() else { return };
        let result = match &command {
            CaptionCommand::Start { language, .. } => self.transport.start_closed_captions(language).await,
            CaptionCommand::Stop { .. } => self.transport.stop_closed_captions().await,
        };
        self.captions.complete(command.token(), result);
    }

    /// Route a transport event. Returns false for other calls and
    /// unsubscribed kinds.
    pub fn handle_event(&mut self, event: &VideoEvent) -> bool {
        let subscribed = self.handlers.iter().any(|(k, _)| *k == event.kind());
        if self.call.as_ref() != Some(event.call()) || !subscribed {
            tracing::trace!(call = %event.call(), event = event.kind().as_str(), "event ignored");
            return false;
        }
        self.captions.handle_event(event)
    }

    /// Run due timers
    pub fn poll(&mut self) {
        self.captions.poll();
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.captions.next_deadline()
    }
}

impl<V: VideoTransport> Drop for CallController<V> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
