//! Scoped highlight ownership for UI fragments.
//!
//! A fragment creates one [`HighlightScope`] for the keys it renders and
//! drops it on teardown; the drop releases every key and latch the fragment
//! still holds.

use crate::highlight::bus::{HighlightBus, SubscriberId};
use log::warn;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Bus handle shared by the session and every live scope.
pub type SharedHighlightBus = Rc<RefCell<HighlightBus>>;

/// Highlight keys owned by one UI fragment.
#[derive(Debug)]
pub struct HighlightScope {
    bus: Weak<RefCell<HighlightBus>>,
    subscriber: SubscriberId,
    keys: Vec<String>,
    hovered: bool,
}

impl HighlightScope {
    /// Registers a new fragment for `keys` without highlighting anything yet.
    pub fn new(bus: &SharedHighlightBus, keys: Vec<String>) -> Self {
        let subscriber = bus.borrow_mut().register();
        Self {
            bus: Rc::downgrade(bus),
            subscriber,
            keys,
            hovered: false,
        }
    }

    pub fn subscriber(&self) -> SubscriberId {
        self.subscriber
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Pointer entered the fragment.
    pub fn enter(&mut self) {
        if self.hovered {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.borrow_mut().show(self.subscriber, &self.keys);
            self.hovered = true;
        }
    }

    /// Pointer left the fragment.
    pub fn leave(&mut self) {
        if !self.hovered {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.borrow_mut().hide(self.subscriber, &self.keys);
        }
        self.hovered = false;
    }

    /// Click: pins the fragment's keys, or unpins them when already pinned.
    pub fn toggle_latch(&self) -> bool {
        let Some(bus) = self.bus.upgrade() else {
            return false;
        };
        let latched = bus.borrow_mut().toggle_latched(self.subscriber, &self.keys);
        latched
    }

    /// Whether any of the fragment's keys is highlighted by anyone.
    pub fn is_highlighted(&self) -> bool {
        let Some(bus) = self.bus.upgrade() else {
            return false;
        };
        let highlighted = bus.borrow().is_highlighted(&self.keys);
        highlighted
    }
}

impl Drop for HighlightScope {
    fn drop(&mut self) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        match bus.try_borrow_mut() {
            Ok(mut bus) => bus.dispose_all(self.subscriber),
            Err(_) => warn!(
                "event=highlight_dispose module=highlight status=error subscriber={} error_code=bus_busy",
                self.subscriber.as_u64()
            ),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::{HighlightScope, SharedHighlightBus};

    fn shared_bus() -> SharedHighlightBus {
        SharedHighlightBus::default()
    }

    #[test]
    fn drop_releases_hover_and_latch() {
        let bus = shared_bus();
        {
            let mut row = HighlightScope::new(&bus, vec!["range1".into(), "sig1".into()]);
            row.enter();
            assert!(row.toggle_latch());
            assert!(bus.borrow().is_active(&["sig1"]));
            assert!(bus.borrow().is_latched(&["range1"]));
        }
        assert!(!bus.borrow().is_highlighted(&["range1", "sig1"]));
    }

    #[test]
    fn repeated_enter_counts_once() {
        let bus = shared_bus();
        let mut row = HighlightScope::new(&bus, vec!["sig1".into()]);
        row.enter();
        row.enter();
        assert_eq!(bus.borrow().count("sig1"), 1);
        row.leave();
        row.leave();
        assert_eq!(bus.borrow().count("sig1"), 0);
    }

    #[test]
    fn sibling_scope_survives_drop() {
        let bus = shared_bus();
        let mut signal_row = HighlightScope::new(&bus, vec!["range1".into()]);
        signal_row.enter();
        {
            let mut range_row = HighlightScope::new(&bus, vec!["range1".into()]);
            range_row.enter();
        }
        assert!(signal_row.is_highlighted());
    }

    #[test]
    fn scope_outliving_bus_is_harmless() {
        let bus = shared_bus();
        let mut row = HighlightScope::new(&bus, vec!["sig1".into()]);
        drop(bus);
        row.enter();
        assert!(!row.is_highlighted());
        assert!(!row.toggle_latch());
    }
}
