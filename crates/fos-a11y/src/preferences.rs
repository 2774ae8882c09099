//! Accessibility preferences
//!
//! Settings derived from environment media features, with user overrides.

use serde::{Deserialize, Serialize};

/// Screen reader user-agent tokens, matched case-insensitively
const SCREEN_READER_TOKENS: &[&str] = &["nvda", "jaws", "voiceover", "talkback"];

/// Environment media features
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MediaFeatures {
    /// `prefers-reduced-motion: reduce`
    pub prefers_reduced_motion: bool,
    /// `prefers-contrast: high`
    pub prefers_high_contrast: bool,
    /// `pointer: fine`
    pub pointer_fine: bool,
    pub user_agent: String,
}

/// A single preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting {
    ReducedMotion,
    HighContrast,
    ScreenReaderEnabled,
    KeyboardNavigation,
}

/// Accessibility settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessibilitySettings {
    pub reduced_motion: bool,
    pub high_contrast: bool,
    pub screen_reader_enabled: bool,
    pub keyboard_navigation: bool,
}

impl AccessibilitySettings {
    pub fn detect(features: &MediaFeatures) -> Self {
        let mut settings = Self::default();
        settings.refresh(features);
        settings
    }

    /// Re-read every detected setting; overrides are replaced
    pub fn refresh(&mut self, features: &MediaFeatures) {
        let agent = features.user_agent.to_ascii_lowercase();
        self.reduced_motion = features.prefers_reduced_motion;
        self.high_contrast = features.prefers_high_contrast;
        self.screen_reader_enabled = SCREEN_READER_TOKENS.iter().any(|t| agent.contains(t));
        // No fine pointer means the user is probably driving with a keyboard
        self.keyboard_navigation = !features.pointer_fine;
        tracing::debug!(settings = ?self, "accessibility settings detected");
    }

    pub fn update(&mut self, setting: Setting, value: bool) {
        *self.slot(setting) = value;
    }

    pub fn get(&self, setting: Setting) -> bool {
        match setting {
            Setting::ReducedMotion => self.reduced_motion,
            Setting::HighContrast => self.high_contrast,
            Setting::ScreenReaderEnabled => self.screen_reader_enabled,
            Setting::KeyboardNavigation => self.keyboard_navigation,
        }
    }

    fn slot(&mut self, setting: Setting) -> &mut bool {
        match setting {
            Setting::ReducedMotion => &mut self.reduced_motion,
            Setting::HighContrast => &mut self.high_contrast,
            Setting::ScreenReaderEnabled => &mut self.screen_reader_enabled,
            Setting::KeyboardNavigation => &mut self.keyboard_navigation,
        }
    }
}
