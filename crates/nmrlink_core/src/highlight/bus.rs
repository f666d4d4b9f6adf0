//! Reference-counted highlight key store.
//!
//! # Responsibility
//! - Track which highlight keys are active and how many holders keep them.
//! - Keep at most one latched (click-pinned) key set.
//! - Notify listeners synchronously after every effective change.
//!
//! # Invariants
//! - Counts are never negative; a key at zero is removed.
//! - A subscriber can only release what it acquired.
//! - Subscriber ids are unique for the whole process, across buses, so an
//!   id issued by a dropped bus never matches a live holder.
//! - `dispose` and `hide`/`clear` of unknown keys are no-ops, never errors.

use log::debug;
use std::collections::{BTreeSet, HashMap};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SUBSCRIBER: AtomicU64 = AtomicU64::new(1);

/// Identity of one UI fragment holding highlight keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }
}

/// Handle returned by [`HighlightBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Effective change produced by one bus operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightChange {
    /// Keys that went from inactive to active.
    pub shown: Vec<String>,
    /// Keys that went from active to inactive.
    pub hidden: Vec<String>,
    pub latch_changed: bool,
}

impl HighlightChange {
    pub fn is_empty(&self) -> bool {
        self.shown.is_empty() && self.hidden.is_empty() && !self.latch_changed
    }
}

/// Listener callback. Must not call back into the bus.
pub type HighlightListener = Box<dyn FnMut(&HighlightChange)>;

struct LatchedSet {
    owner: SubscriberId,
    keys: BTreeSet<String>,
}

/// Process-wide highlight state owned by the session root.
#[derive(Default)]
pub struct HighlightBus {
    counts: HashMap<String, u32>,
    holdings: HashMap<SubscriberId, HashMap<String, u32>>,
    latched: Option<LatchedSet>,
    listeners: Vec<(ListenerId, HighlightListener)>,
    next_listener: u64,
}

impl Debug for HighlightBus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightBus")
            .field("counts", &self.counts)
            .field("latched", &self.latched.as_ref().map(|set| &set.keys))
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl HighlightBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one holder of highlight keys.
    pub fn register(&mut self) -> SubscriberId {
        SubscriberId(NEXT_SUBSCRIBER.fetch_add(1, Ordering::Relaxed))
    }

    /// Adds a change listener.
    pub fn subscribe(&mut self, listener: HighlightListener) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    /// Increments each key on behalf of `subscriber`.
    pub fn show<K: AsRef<str>>(&mut self, subscriber: SubscriberId, keys: &[K]) {
        if keys.is_empty() {
            return;
        }
        let mut change = HighlightChange::default();
        let holding = self.holdings.entry(subscriber).or_default();
        for key in keys {
            let key = key.as_ref();
            *holding.entry(key.to_string()).or_insert(0) += 1;
            let count = self.counts.entry(key.to_string()).or_insert(0);
            *count += 1;
            if *count == 1 {
                change.shown.push(key.to_string());
            }
        }
        self.notify(change);
    }

    /// Decrements keys previously shown by `subscriber`.
    pub fn hide<K: AsRef<str>>(&mut self, subscriber: SubscriberId, keys: &[K]) {
        if keys.is_empty() {
            return;
        }
        let mut change = HighlightChange::default();
        if let Some(holding) = self.holdings.get_mut(&subscriber) {
            for key in keys {
                let key = key.as_ref();
                let Some(held) = holding.get_mut(key) else {
                    continue;
                };
                *held -= 1;
                if *held == 0 {
                    holding.remove(key);
                }
                if release_count(&mut self.counts, key, 1) {
                    change.hidden.push(key.to_string());
                }
            }
        }
        self.notify(change);
    }

    /// Whether any key is held by at least one subscriber.
    pub fn is_active<K: AsRef<str>>(&self, keys: &[K]) -> bool {
        keys.iter()
            .any(|key| self.counts.get(key.as_ref()).copied().unwrap_or(0) > 0)
    }

    /// Whether any key is active or latched.
    pub fn is_highlighted<K: AsRef<str>>(&self, keys: &[K]) -> bool {
        self.is_active(keys) || self.is_latched(keys)
    }

    /// Current reference count of `key`.
    pub fn count(&self, key: &str) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Replaces the single latched set. An empty set unlatches.
    pub fn set_latched<K: AsRef<str>>(&mut self, subscriber: SubscriberId, keys: &[K]) {
        let next: BTreeSet<String> = keys.iter().map(|key| key.as_ref().to_string()).collect();
        if next.is_empty() {
            self.unset_latched();
            return;
        }
        let unchanged = self
            .latched
            .as_ref()
            .is_some_and(|current| current.owner == subscriber && current.keys == next);
        if unchanged {
            return;
        }
        debug!(
            "event=highlight_latch module=highlight status=ok subscriber={} keys={}",
            subscriber.0,
            next.len()
        );
        self.latched = Some(LatchedSet {
            owner: subscriber,
            keys: next,
        });
        self.notify(HighlightChange {
            latch_changed: true,
            ..HighlightChange::default()
        });
    }

    pub fn unset_latched(&mut self) {
        if self.latched.take().is_some() {
            self.notify(HighlightChange {
                latch_changed: true,
                ..HighlightChange::default()
            });
        }
    }

    /// Latches `keys`, or unlatches when they are already the latched set.
    ///
    /// Returns whether `keys` are latched afterwards.
    pub fn toggle_latched<K: AsRef<str>>(&mut self, subscriber: SubscriberId, keys: &[K]) -> bool {
        let requested: BTreeSet<&str> = keys.iter().map(|key| key.as_ref()).collect();
        let already = self.latched.as_ref().is_some_and(|current| {
            current.keys.len() == requested.len()
                && current.keys.iter().all(|key| requested.contains(key.as_str()))
        });
        if already {
            self.unset_latched();
            false
        } else {
            self.set_latched(subscriber, keys);
            self.latched.is_some()
        }
    }

    /// Whether any key is part of the latched set.
    pub fn is_latched<K: AsRef<str>>(&self, keys: &[K]) -> bool {
        let Some(latched) = &self.latched else {
            return false;
        };
        keys.iter().any(|key| latched.keys.contains(key.as_ref()))
    }

    pub fn latched_keys(&self) -> Vec<String> {
        self.latched
            .as_ref()
            .map(|set| set.keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Sorted list of active keys.
    pub fn active_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.counts.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Releases everything `subscriber` holds on `keys`, plus its latch.
    ///
    /// Calling this twice is equivalent to calling it once.
    pub fn dispose<K: AsRef<str>>(&mut self, subscriber: SubscriberId, keys: &[K]) {
        let mut change = HighlightChange::default();
        if let Some(holding) = self.holdings.get_mut(&subscriber) {
            for key in keys {
                let key = key.as_ref();
                if let Some(held) = holding.remove(key) {
                    if release_count(&mut self.counts, key, held) {
                        change.hidden.push(key.to_string());
                    }
                }
            }
            if holding.is_empty() {
                self.holdings.remove(&subscriber);
            }
        }
        let owns_latch = self.latched.as_ref().is_some_and(|latched| {
            latched.owner == subscriber
                && keys.iter().any(|key| latched.keys.contains(key.as_ref()))
        });
        if owns_latch {
            self.latched = None;
            change.latch_changed = true;
        }
        self.notify(change);
    }

    /// Releases every key `subscriber` holds, plus its latch.
    pub fn dispose_all(&mut self, subscriber: SubscriberId) {
        let keys: Vec<String> = self
            .holdings
            .get(&subscriber)
            .map(|holding| holding.keys().cloned().collect())
            .unwrap_or_default();
        let mut change = HighlightChange::default();
        for key in &keys {
            let held = self
                .holdings
                .get(&subscriber)
                .and_then(|holding| holding.get(key).copied())
                .unwrap_or(0);
            if release_count(&mut self.counts, key, held) {
                change.hidden.push(key.clone());
            }
        }
        self.holdings.remove(&subscriber);
        if self
            .latched
            .as_ref()
            .is_some_and(|latched| latched.owner == subscriber)
        {
            self.latched = None;
            change.latch_changed = true;
        }
        self.notify(change);
    }

    /// Force-removes keys regardless of holder, including from the latch.
    ///
    /// Used when the entity a key refers to no longer exists.
    pub fn clear<K: AsRef<str>>(&mut self, keys: &[K]) {
        let mut change = HighlightChange::default();
        for key in keys {
            let key = key.as_ref();
            if self.counts.remove(key).is_some() {
                change.hidden.push(key.to_string());
            }
            for holding in self.holdings.values_mut() {
                holding.remove(key);
            }
            if let Some(latched) = self.latched.as_mut() {
                if latched.keys.remove(key) {
                    change.latch_changed = true;
                }
            }
        }
        self.holdings.retain(|_, holding| !holding.is_empty());
        if self
            .latched
            .as_ref()
            .is_some_and(|latched| latched.keys.is_empty())
        {
            self.latched = None;
        }
        self.notify(change);
    }

    fn notify(&mut self, change: HighlightChange) {
        if change.is_empty() {
            return;
        }
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}

/// Subtracts `amount` from `key`; returns true when the key became inactive.
fn release_count(counts: &mut HashMap<String, u32>, key: &str, amount: u32) -> bool {
    let Some(count) = counts.get_mut(key) else {
        return false;
    };
    *count = count.saturating_sub(amount);
    if *count == 0 {
        counts.remove(key);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{HighlightBus, HighlightChange};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn overlapping_subscribers_keep_key_active_until_last_hide() {
        let mut bus = HighlightBus::new();
        let range_row = bus.register();
        let signal_row = bus.register();

        bus.show(range_row, &["sig1"]);
        bus.show(signal_row, &["sig1"]);
        bus.hide(range_row, &["sig1"]);
        assert!(bus.is_active(&["sig1"]));

        bus.hide(signal_row, &["sig1"]);
        assert!(!bus.is_active(&["sig1"]));
    }

    #[test]
    fn extra_hide_never_goes_negative() {
        let mut bus = HighlightBus::new();
        let row = bus.register();
        bus.show(row, &["sig1"]);
        bus.hide(row, &["sig1"]);
        bus.hide(row, &["sig1"]);
        bus.hide(row, &["unknown"]);
        assert_eq!(bus.count("sig1"), 0);
        assert!(bus.active_keys().is_empty());

        bus.show(row, &["sig1"]);
        assert_eq!(bus.count("sig1"), 1);
    }

    #[test]
    fn ids_from_a_dropped_bus_never_match_a_new_bus() {
        let mut old_bus = HighlightBus::new();
        let stale = old_bus.register();
        drop(old_bus);

        let mut bus = HighlightBus::new();
        let live = bus.register();
        assert_ne!(stale, live);
        bus.show(live, &["b"]);
        bus.dispose_all(stale);
        assert!(bus.is_active(&["b"]));
    }

    #[test]
    fn subscriber_cannot_release_foreign_holding() {
        let mut bus = HighlightBus::new();
        let owner = bus.register();
        let stranger = bus.register();
        bus.show(owner, &["zone1"]);
        bus.hide(stranger, &["zone1"]);
        assert!(bus.is_active(&["zone1"]));
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut bus = HighlightBus::new();
        let first = bus.register();
        let second = bus.register();
        bus.show(first, &["sig1", "sig1"]);
        bus.show(second, &["sig1"]);
        bus.set_latched(first, &["sig1"]);

        bus.dispose(first, &["sig1"]);
        assert_eq!(bus.count("sig1"), 1);
        assert!(!bus.is_latched(&["sig1"]));

        bus.dispose(first, &["sig1"]);
        assert_eq!(bus.count("sig1"), 1);
    }

    #[test]
    fn only_one_latched_set_exists() {
        let mut bus = HighlightBus::new();
        let row_a = bus.register();
        let row_b = bus.register();
        bus.set_latched(row_a, &["a1", "a2"]);
        bus.set_latched(row_b, &["b1"]);
        assert!(!bus.is_latched(&["a1"]));
        assert!(bus.is_latched(&["b1"]));
        assert_eq!(bus.latched_keys(), vec!["b1".to_string()]);

        assert!(!bus.toggle_latched(row_b, &["b1"]));
        assert!(bus.latched_keys().is_empty());
    }

    #[test]
    fn clear_removes_key_from_every_holder_and_latch() {
        let mut bus = HighlightBus::new();
        let first = bus.register();
        let second = bus.register();
        bus.show(first, &["sig9"]);
        bus.show(second, &["sig9"]);
        bus.set_latched(first, &["sig9"]);

        bus.clear(&["sig9"]);
        assert!(!bus.is_highlighted(&["sig9"]));

        bus.hide(first, &["sig9"]);
        assert_eq!(bus.count("sig9"), 0);
    }

    #[test]
    fn listeners_receive_effective_changes_only() {
        let mut bus = HighlightBus::new();
        let seen: Rc<RefCell<Vec<HighlightChange>>> = Rc::default();
        let sink = Rc::clone(&seen);
        bus.subscribe(Box::new(move |change: &HighlightChange| {
            sink.borrow_mut().push(change.clone())
        }));

        let row = bus.register();
        bus.show(row, &["sig1"]);
        bus.show(row, &["sig1"]);
        bus.show::<&str>(row, &[]);
        bus.hide(row, &["sig1"]);
        bus.hide(row, &["sig1"]);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].shown, vec!["sig1".to_string()]);
        assert_eq!(seen[1].hidden, vec!["sig1".to_string()]);
    }
}
