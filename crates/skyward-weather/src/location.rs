//! Device location feed.
//!
//! Platform code pushes fixes into a `LocationSource`; the orchestrator reads
//! them as a combined-latest `(coordinate, authorized)` pair.

use parking_lot::Mutex;
use skyward_core::Coordinate;
use tokio::sync::watch;

/// Latest known coordinate and authorization status.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocationFix {
    pub coordinate: Option<Coordinate>,
    pub authorized: bool,
}

/// Anything that can report device location changes.
pub trait LocationSource: Send + Sync {
    /// A receiver that always holds the latest fix.
    fn subscribe(&self) -> watch::Receiver<LocationFix>;
}

/// `watch`-backed source that platform code (or tests) push into.
pub struct ChannelLocationSource {
    tx: watch::Sender<LocationFix>,
    // Serializes read-modify-write updates of a single field.
    update: Mutex<()>,
}

impl Default for ChannelLocationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelLocationSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LocationFix::default());
        Self {
            tx,
            update: Mutex::new(()),
        }
    }

    pub fn set_coordinate(&self, coordinate: Option<Coordinate>) {
        let _guard = self.update.lock();
        let fix = LocationFix {
            coordinate,
            ..*self.tx.borrow()
        };
        self.tx.send_replace(fix);
    }

    pub fn set_authorized(&self, authorized: bool) {
        let _guard = self.update.lock();
        let fix = LocationFix {
            authorized,
            ..*self.tx.borrow()
        };
        self.tx.send_replace(fix);
    }

    /// Replace both fields at once.
    pub fn publish(&self, fix: LocationFix) {
        let _guard = self.update.lock();
        self.tx.send_replace(fix);
    }

    pub fn current(&self) -> LocationFix {
        *self.tx.borrow()
    }
}

impl LocationSource for ChannelLocationSource {
    fn subscribe(&self) -> watch::Receiver<LocationFix> {
        self.tx.subscribe()
    }
}

/// Edge detector for "first usable fix".
///
/// Fires once for the first authorized coordinate after construction, and
/// again after each unauthorized to authorized transition. Later coordinate
/// updates are recorded but do not fire.
#[derive(Debug, Clone)]
pub struct LocationTracker {
    coordinate: Option<Coordinate>,
    authorized: bool,
    armed: bool,
}

impl Default for LocationTracker {
    fn default() -> Self {
        Self {
            coordinate: None,
            authorized: false,
            armed: true,
        }
    }
}

impl LocationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fix; returns `true` when it should trigger a resolve.
    pub fn observe(&mut self, coordinate: Option<Coordinate>, authorized: bool) -> bool {
        if authorized && !self.authorized {
            self.armed = true;
        }
        self.authorized = authorized;
        self.coordinate = coordinate;

        if self.armed && authorized && coordinate.is_some() {
            self.armed = false;
            return true;
        }
        false
    }

    /// Last observed coordinate, whether or not it was authorized.
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    /// Last observed coordinate if location access is authorized.
    pub fn usable_coordinate(&self) -> Option<Coordinate> {
        if self.authorized {
            self.coordinate
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Option<Coordinate> {
        Some(Coordinate::new(40.0, -74.0))
    }

    fn there() -> Option<Coordinate> {
        Some(Coordinate::new(41.0, -73.0))
    }

    #[test]
    fn test_fires_once_for_first_authorized_fix() {
        let mut tracker = LocationTracker::new();
        assert!(!tracker.observe(None, true));
        assert!(tracker.observe(here(), true));
        assert!(!tracker.observe(there(), true));
        assert!(!tracker.observe(here(), true));
        assert_eq!(tracker.coordinate(), here());
    }

    #[test]
    fn test_unauthorized_fix_does_not_fire() {
        let mut tracker = LocationTracker::new();
        assert!(!tracker.observe(here(), false));
        assert_eq!(tracker.usable_coordinate(), None);
        assert!(tracker.observe(here(), true));
    }

    #[test]
    fn test_rearms_after_reauthorization() {
        let mut tracker = LocationTracker::new();
        assert!(tracker.observe(here(), true));
        assert!(!tracker.observe(here(), false));
        assert!(tracker.observe(there(), true));
        assert!(!tracker.observe(here(), true));
    }

    #[test]
    fn test_channel_source_combines_latest() {
        let source = ChannelLocationSource::new();
        let rx = source.subscribe();

        source.set_authorized(true);
        source.set_coordinate(here());
        assert_eq!(
            *rx.borrow(),
            LocationFix {
                coordinate: here(),
                authorized: true
            }
        );

        source.set_authorized(false);
        assert_eq!(source.current().coordinate, here());
        assert!(!source.current().authorized);

        source.publish(LocationFix::default());
        assert_eq!(*rx.borrow(), LocationFix::default());
    }
}
