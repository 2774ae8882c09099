//! Announcement Channel
//!
//! Screen reader notifications rendered through one `aria-live` region per
//! politeness level.
//!
//! Each [`Announcer::announce`] call clears its region, writes the new text
//! after a short delay (so identical consecutive texts still register as a
//! fresh mutation), and clears it again once the display window elapses.
//! A newer call on the same region preempts the older one outright: the old
//! text is dropped, never queued, and both timers restart.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::clock::{Clock, SystemClock};
use crate::platform::{LiveRegionHost, PlatformError, RegionHandle};

/// Live region politeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Politeness {
    #[default]
    Polite,
    Assertive,
}

impl Politeness {
    /// `aria-live` attribute value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polite => "polite",
            Self::Assertive => "assertive",
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::Polite => 0,
            Self::Assertive => 1,
        }
    }
}

/// Announcement identifier, unique per announcer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnouncementId(pub u64);

/// Screen reader announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub id: AnnouncementId,
    pub text: String,
    pub priority: Politeness,
    pub created_at_ms: u64,
}

/// Announcement timing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnnouncerConfig {
    /// Delay between clearing a region and writing the new text
    pub write_delay_ms: u64,
    /// How long text stays in the region before it is cleared
    pub display_ms: u64,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            write_delay_ms: 10,
            display_ms: 1000,
        }
    }
}

#[derive(Debug)]
struct LiveRegion {
    politeness: Politeness,
    handle: Option<RegionHandle>,
    /// Latest announcement, pending or visible
    current: Option<Announcement>,
    /// Text the region should show right now
    text: String,
    /// Text the host last accepted; `None` until the first successful write
    rendered: Option<String>,
    write_at: Option<u64>,
    clear_at: Option<u64>,
}

impl LiveRegion {
    fn new(politeness: Politeness) -> Self {
        Self {
            politeness,
            handle: None,
            current: None,
            text: String::new(),
            rendered: None,
            write_at: None,
            clear_at: None,
        }
    }

    fn is_dirty(&self) -> bool {
        match &self.rendered {
            Some(rendered) => *rendered != self.text,
            // Never-used regions stay unmounted
            None => self.handle.is_some() || self.current.is_some() || !self.text.is_empty(),
        }
    }

    /// Push `text` to the host, mounting the region on first use.
    fn sync(&mut self, host: &mut dyn LiveRegionHost) {
        if !self.is_dirty() {
            return;
        }

        let handle = match self.handle {
            Some(h) => h,
            None => match host.mount(self.politeness) {
                Ok(h) => {
                    tracing::debug!(politeness = self.politeness.as_str(), host = host.platform_name(), "live region mounted");
                    self.handle = Some(h);
                    h
                }
                Err(e) => {
                    tracing::debug!(error = %e, "live region mount deferred");
                    return;
                }
            },
        };

        match host.write(handle, &self.text) {
            Ok(()) => self.rendered = Some(self.text.clone()),
            Err(PlatformError::Detached) => {
                // Remount on the next sync
                tracing::debug!(politeness = self.politeness.as_str(), "live region detached");
                self.handle = None;
                self.rendered = None;
            }
            Err(e) => tracing::debug!(error = %e, "live region write deferred"),
        }
    }
}

struct Inner {
    config: AnnouncerConfig,
    clock: Rc<dyn Clock>,
    host: Option<Box<dyn LiveRegionHost>>,
    regions: [LiveRegion; 2],
    next_id: u64,
}

impl Inner {
    fn fresh_regions() -> [LiveRegion; 2] {
        [LiveRegion::new(Politeness::Polite), LiveRegion::new(Politeness::Assertive)]
    }

    fn sync_all(&mut self) {
        let Some(host) = self.host.as_deref_mut() else { return };
        for region in &mut self.regions {
            region.sync(host);
        }
    }

    fn run_timers(&mut self, now: u64) {
        for slot in 0..self.regions.len() {
            let region = &mut self.regions[slot];
            if region.write_at.is_some_and(|t| t <= now) {
                region.write_at = None;
                region.text = region.current.as_ref().map(|a| a.text.clone()).unwrap_or_default();
                if let Some(host) = self.host.as_deref_mut() {
                    region.sync(host);
                }
            }

            let region = &mut self.regions[slot];
            if region.clear_at.is_some_and(|t| t <= now) {
                region.clear_at = None;
                region.current = None;
                region.text.clear();
            }
        }
        self.sync_all();
    }
}

/// Process-wide announcement service
///
/// Cheap to clone; every clone drives the same pair of live regions.
/// Construct one at startup, [`init`](Self::init) it with a host, and hand
/// clones to every component that speaks.
#[derive(Clone)]
pub struct Announcer {
    inner: Rc<RefCell<Inner>>,
}

impl Announcer {
    pub fn new(config: AnnouncerConfig, clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                config,
                clock,
                host: None,
                regions: Inner::fresh_regions(),
                next_id: 0,
            })),
        }
    }

    /// Announcer with default timing and no host; every announcement is dropped
    pub fn detached() -> Self {
        Self::new(AnnouncerConfig::default(), Rc::new(SystemClock::new()))
    }

    /// Attach the rendering environment, replacing any previous one
    pub fn init(&self, host: Box<dyn LiveRegionHost>) {
        self.cleanup();
        tracing::info!(host = host.platform_name(), "announcer initialized");
        self.inner.borrow_mut().host = Some(host);
    }

    /// Unmount both regions and detach the host
    pub fn cleanup(&self) {
        let mut inner = self.inner.borrow_mut();
        let regions = std::mem::replace(&mut inner.regions, Inner::fresh_regions());
        if let Some(mut host) = inner.host.take() {
            for handle in regions.iter().filter_map(|r| r.handle) {
                host.unmount(handle);
            }
            tracing::debug!(host = host.platform_name(), "announcer cleaned up");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.borrow().host.is_some()
    }

    /// Announce `text` to assistive technology
    ///
    /// Silently does nothing when no host is attached.
    pub fn announce(&self, text: &str, priority: Politeness) {
        let mut inner = self.inner.borrow_mut();
        if inner.host.is_none() {
            tracing::trace!(text, "announcement dropped: no live region host");
            return;
        }

        let now = inner.clock.now_ms();
        let id = AnnouncementId(inner.next_id);
        inner.next_id += 1;
        let (write_delay, display) = (inner.config.write_delay_ms, inner.config.display_ms);

        let region = &mut inner.regions[priority.slot()];
        if let Some(prev) = region.current.take() {
            tracing::trace!(superseded = ?prev.id, "announcement preempted");
        }
        region.current = Some(Announcement {
            id,
            text: text.to_string(),
            priority,
            created_at_ms: now,
        });
        region.text.clear();
        region.write_at = Some(now + write_delay);
        region.clear_at = Some(now + display.max(write_delay));

        tracing::debug!(?id, priority = priority.as_str(), text, "announce");
        inner.sync_all();
        inner.run_timers(now);
    }

    /// Fire due timers and retry deferred host writes
    pub fn poll(&self) {
        let mut inner = self.inner.borrow_mut();
        let now = inner.clock.now_ms();
        inner.run_timers(now);
    }

    /// Earliest time `poll` has work to do
    pub fn next_deadline(&self) -> Option<u64> {
        let inner = self.inner.borrow();
        inner.host.as_ref()?;
        let now = inner.clock.now_ms();
        inner
            .regions
            .iter()
            .flat_map(|r| {
                let retry = r.is_dirty().then_some(now);
                [r.write_at, r.clear_at, retry]
            })
            .flatten()
            .min()
    }

    /// Text the region currently shows
    pub fn visible_text(&self, priority: Politeness) -> String {
        self.inner.borrow().regions[priority.slot()].text.clone()
    }

    /// Announcement occupying the region (pending or visible)
    pub fn current(&self, priority: Politeness) -> Option<Announcement> {
        self.inner.borrow().regions[priority.slot()].current.clone()
    }

    pub fn config(&self) -> AnnouncerConfig {
        self.inner.borrow().config.clone()
    }
}

impl fmt::Debug for Announcer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Announcer")
            .field("config", &inner.config)
            .field("host", &inner.host.as_ref().map(|h| h.platform_name()))
            .field("regions", &inner.regions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    /// Host that accepts everything and remembers nothing
    struct SinkHost {
        mounted: u64,
    }

    impl LiveRegionHost for SinkHost {
        fn mount(&mut self, _: Politeness) -> Result<RegionHandle, PlatformError> {
            self.mounted += 1;
            Ok(RegionHandle(self.mounted))
        }
        fn write(&mut self, _: RegionHandle, _: &str) -> Result<(), PlatformError> { Ok(()) }
        fn unmount(&mut self, _: RegionHandle) {}
        fn platform_name(&self) -> &'static str { "sink" }
    }

    fn announcer() -> (Announcer, ManualClock) {
        let clock = ManualClock::new();
        let announcer = Announcer::new(AnnouncerConfig::default(), Rc::new(clock.clone()));
        announcer.init(Box::new(SinkHost { mounted: 0 }));
        (announcer, clock)
    }

    #[test]
    fn test_write_after_delay_then_clear() {
        let (a, clock) = announcer();
        a.announce("Live captions started", Politeness::Polite);
        assert_eq!(a.visible_text(Politeness::Polite), "");

        clock.advance(10);
        a.poll();
        assert_eq!(a.visible_text(Politeness::Polite), "Live captions started");

        clock.advance(990);
        a.poll();
        assert_eq!(a.visible_text(Politeness::Polite), "");
        assert!(a.current(Politeness::Polite).is_none());
        assert_eq!(a.next_deadline(), None);
    }

    #[test]
    fn test_preemption_restarts_timer() {
        let (a, clock) = announcer();
        a.announce("first", Politeness::Polite);
        clock.advance(600);
        a.poll();
        a.announce("second", Politeness::Polite);

        // The first announcement's clear time passes without clearing "second"
        clock.advance(500);
        a.poll();
        assert_eq!(a.visible_text(Politeness::Polite), "second");

        clock.advance(500);
        a.poll();
        assert_eq!(a.visible_text(Politeness::Polite), "");
    }

    #[test]
    fn test_priorities_are_independent() {
        let (a, clock) = announcer();
        a.announce("polite", Politeness::Polite);
        a.announce("urgent", Politeness::Assertive);
        clock.advance(10);
        a.poll();
        assert_eq!(a.visible_text(Politeness::Polite), "polite");
        assert_eq!(a.visible_text(Politeness::Assertive), "urgent");
    }

    #[test]
    fn test_no_host_is_noop() {
        let a = Announcer::detached();
        a.announce("nobody hears this", Politeness::Assertive);
        assert!(a.current(Politeness::Assertive).is_none());
        assert_eq!(a.next_deadline(), None);
    }

    #[test]
    fn test_zero_delay_writes_immediately() {
        let clock = ManualClock::new();
        let config = AnnouncerConfig { write_delay_ms: 0, display_ms: 1000 };
        let a = Announcer::new(config, Rc::new(clock));
        a.init(Box::new(SinkHost { mounted: 0 }));
        a.announce("now", Politeness::Polite);
        assert_eq!(a.visible_text(Politeness::Polite), "now");
    }
}
