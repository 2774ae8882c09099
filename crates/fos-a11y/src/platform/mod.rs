//! Live Region Hosts
//!
//! Abstraction over the environment that actually renders `aria-live`
//! regions. The announcer never talks to a document directly; it mounts
//! one region per politeness level through a host and writes text into it.

mod document;

pub use document::DocumentHost;

use crate::announce::Politeness;

/// Opaque handle to a mounted live region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionHandle(pub u64);

/// Environment that renders live regions for assistive technology
pub trait LiveRegionHost {
    /// Create an off-screen live region
    fn mount(&mut self, politeness: Politeness) -> Result<RegionHandle, PlatformError>;

    /// Replace the region's text
    fn write(&mut self, region: RegionHandle, text: &str) -> Result<(), PlatformError>;

    /// Remove the region from the environment
    fn unmount(&mut self, region: RegionHandle);

    /// Host name for logs
    fn platform_name(&self) -> &'static str;
}

/// Live region host error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// Host is mid-mutation elsewhere; retry later
    #[error("Host busy")]
    Busy,

    /// Region node was removed behind the announcer's back
    #[error("Live region detached")]
    Detached,

    #[error("Host unavailable: {0}")]
    Unavailable(String),
}
