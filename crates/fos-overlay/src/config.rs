//! Overlay Configuration

use std::path::Path;

use fos_a11y::{AnnouncerConfig, MediaFeatures};
use fos_chat::ChatConfig;
use fos_meeting::{CallConfig, CaptionConfig};
use serde::Deserialize;

use crate::OverlayError;

/// Overlay configuration options
///
/// Every section is optional in JSON; missing fields take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Live region timing
    pub announcer: AnnouncerConfig,

    /// Transcript size, caption language and error reset
    pub captions: CaptionConfig,

    /// History page size and attachment limits
    pub chat: ChatConfig,

    /// Device handling on join
    pub call: CallConfig,

    /// Media features reported by the environment
    pub media: MediaFeatures,
}

impl OverlayConfig {
    pub fn from_json(json: &str) -> Result<Self, OverlayError> {
        serde_json::from_str(json).map_err(OverlayError::Config)
    }

    /// Read a JSON config file
    pub fn load(path: &Path) -> Result<Self, OverlayError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), ?config, "configuration loaded");
        Ok(config)
    }
}
