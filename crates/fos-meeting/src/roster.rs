//! Participant roster and caption speaker resolution

use crate::transport::{CaptionEvent, Participant};

/// Participants currently in the call, keyed by session id
#[derive(Debug, Clone, Default)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn replace(&mut self, participants: Vec<Participant>) {
        self.participants = participants;
    }

    /// Add a participant or refresh one with the same session id
    pub fn upsert(&mut self, participant: Participant) {
        match self.participants.iter_mut().find(|p| p.session_id == participant.session_id) {
            Some(existing) => *existing = participant,
            None => self.participants.push(participant),
        }
    }

    pub fn remove(&mut self, session_id: &str) -> Option<Participant> {
        let at = self.participants.iter().position(|p| p.session_id == session_id)?;
        Some(self.participants.remove(at))
    }

    pub fn clear(&mut self) {
        self.participants.clear();
    }

    /// Participant a caption belongs to: by user id, then session id, then
    /// display name. First match wins; duplicate display names are not
    /// disambiguated.
    pub fn find_speaker(&self, caption: &CaptionEvent) -> Option<&Participant> {
        let key = caption.speaker_key();
        let by_key = |pick: fn(&Participant) -> &str| {
            (!key.is_empty()).then(|| self.participants.iter().find(|p| pick(p) == key)).flatten()
        };
        by_key(|p| p.user_id.as_str())
            .or_else(|| by_key(|p| p.session_id.as_str()))
            .or_else(|| {
                let name = caption.user_name.as_deref()?;
                self.participants.iter().find(|p| p.name.as_deref() == Some(name))
            })
    }

    /// Display name for a caption's speaker
    pub fn speaker_name(&self, caption: &CaptionEvent) -> String {
        fn non_empty(s: Option<&str>) -> Option<&str> {
            s.filter(|s| !s.is_empty())
        }

        let participant = self.find_speaker(caption);

        non_empty(participant.and_then(|p| p.name.as_deref()))
            .or_else(|| non_empty(caption.user_name.as_deref()))
            .or_else(|| non_empty(participant.map(|p| p.user_id.as_str())))
            .or_else(|| non_empty(Some(caption.speaker_key())))
            .unwrap_or("Participant")
            .to_string()
    }
}
