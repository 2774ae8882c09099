//! fOS Accessibility
//!
//! Assistive-technology services shared by every overlay view.
//!
//! Features:
//! - Announcement channel: one `aria-live` region per politeness level,
//!   last-write-wins with timed cleanup
//! - Focus management: single-slot save/restore and nested focus traps
//! - Roving keyboard navigation over externally rendered lists and toolbars
//! - Live-region hosts (headless document)
//! - Accessibility preference detection
//!
//! Everything here is single-threaded: shared handles use `Rc`, and timers
//! advance only when the owner calls `poll`.

pub mod announce;
pub mod clock;
pub mod focus;
pub mod keyboard_nav;
pub mod platform;
pub mod preferences;

pub use announce::{Announcement, AnnouncementId, Announcer, AnnouncerConfig, Politeness};
pub use clock::{Clock, ManualClock, SystemClock};
pub use focus::{FocusFrame, FocusManager, FocusTrap};
pub use keyboard_nav::{KeyboardNavigationController, KeyboardShortcut, NavAction, NavItems, Orientation};
pub use platform::{DocumentHost, LiveRegionHost, PlatformError, RegionHandle};
pub use preferences::{AccessibilitySettings, MediaFeatures, Setting};
