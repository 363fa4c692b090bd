//! Per-item notification muting.

use crate::utils::elapsed_between;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Suppresses repeat notifications for the same item within a mute window.
///
/// Items are keyed by their exact text; entries are only written when a
/// notification was actually delivered and simply age out afterwards.
#[derive(Debug, Clone)]
pub struct NotificationGate {
    mute_duration: Duration,
    muted: HashMap<String, DateTime<Utc>>,
}

impl NotificationGate {
    pub fn new(mute_duration: Duration) -> Self {
        Self {
            mute_duration,
            muted: HashMap::new(),
        }
    }

    /// Whether `item` may be notified at `now`. Never mutates the mute table.
    pub fn should_notify(&self, item: &str, now: DateTime<Utc>) -> bool {
        match self.muted.get(item) {
            Some(&last) => elapsed_between(last, now) >= self.mute_duration,
            None => true,
        }
    }

    /// Record a delivered notification for `item` at `now`.
    pub fn record_notified(&mut self, item: &str, now: DateTime<Utc>) {
        self.muted.insert(item.to_string(), now);
    }

    /// When `item` was last notified, if ever.
    pub fn last_notified(&self, item: &str) -> Option<DateTime<Utc>> {
        self.muted.get(item).copied()
    }

    pub fn len(&self) -> usize {
        self.muted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.muted.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const D: Duration = Duration::from_secs(10800);

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn unknown_item_is_eligible() {
        let gate = NotificationGate::new(D);
        assert!(gate.should_notify("Limited Edition Shoe", t0()));
    }

    #[test]
    fn muted_for_the_whole_window_and_released_exactly_at_its_end() {
        let mut gate = NotificationGate::new(D);
        gate.record_notified("Limited Edition Shoe", t0());

        assert!(!gate.should_notify("Limited Edition Shoe", t0()));
        assert!(!gate.should_notify("Limited Edition Shoe", t0() + chrono::Duration::seconds(1)));
        let just_before = t0() + chrono::Duration::from_std(D).unwrap() - chrono::Duration::nanoseconds(1);
        assert!(!gate.should_notify("Limited Edition Shoe", just_before));
        assert!(gate.should_notify("Limited Edition Shoe", t0() + chrono::Duration::from_std(D).unwrap()));
    }

    #[test]
    fn should_notify_is_a_pure_read() {
        let gate = NotificationGate::new(D);
        for _ in 0..3 {
            assert!(gate.should_notify("Basic Shoe", t0()));
        }
        assert!(gate.is_empty());
        assert_eq!(gate.last_notified("Basic Shoe"), None);
    }

    #[test]
    fn record_overwrites_stale_entry() {
        let mut gate = NotificationGate::new(D);
        let later = t0() + chrono::Duration::hours(4);
        gate.record_notified("Shoe", t0());
        gate.record_notified("Shoe", later);
        assert_eq!(gate.last_notified("Shoe"), Some(later));
        assert_eq!(gate.len(), 1);
        assert!(!gate.should_notify("Shoe", later + chrono::Duration::hours(1)));
    }

    #[test]
    fn items_are_keyed_by_exact_text() {
        let mut gate = NotificationGate::new(D);
        gate.record_notified("Limited Edition Shoe", t0());
        assert!(gate.should_notify("Limited Edition Shoe ", t0()));
        assert!(gate.should_notify("limited edition shoe", t0()));
    }
}
