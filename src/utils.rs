//! Utility functions shared by the pool, gate and scheduler.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Directory entries verified longer ago than this are considered stale.
pub(crate) const RECENT_CHECK_MINUTES: u64 = 30;

/// Whether a directory "last checked" label such as `"9 secs ago"` or
/// `"3 mins ago"` falls within the recency window.
pub fn is_recently_checked(label: &str) -> bool {
    let label = label.trim().to_lowercase();
    let mut parts = label.split_whitespace();
    let (Some(count), Some(unit)) = (parts.next(), parts.next()) else {
        return false;
    };

    if unit.starts_with("sec") {
        true
    } else if unit.starts_with("min") {
        count
            .parse::<u64>()
            .map(|minutes| minutes <= RECENT_CHECK_MINUTES)
            .unwrap_or(false)
    } else {
        false
    }
}

/// Time elapsed from `earlier` to `now`, clamped at zero.
pub(crate) fn elapsed_between(earlier: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - earlier).to_std().unwrap_or(Duration::ZERO)
}

/// Draw a duration uniformly from an inclusive range.
pub(crate) fn uniform_duration<R: Rng + ?Sized>(rng: &mut R, range: &RangeInclusive<Duration>) -> Duration {
    let (lo, hi) = (range.start().as_secs_f64(), range.end().as_secs_f64());
    if lo >= hi {
        return *range.start();
    }
    Duration::from_secs_f64(rng.random_range(lo..=hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn seconds_labels_are_always_recent() {
        assert!(is_recently_checked("9 secs ago"));
        assert!(is_recently_checked("59 secs ago"));
        assert!(is_recently_checked("1 sec ago"));
    }

    #[test]
    fn minutes_labels_within_thirty_are_recent() {
        assert!(is_recently_checked("1 min ago"));
        assert!(is_recently_checked("3 mins ago"));
        assert!(is_recently_checked("30 mins ago"));
        assert!(is_recently_checked("  12 Mins ago "));
    }

    #[test]
    fn minutes_labels_over_thirty_are_stale() {
        assert!(!is_recently_checked("31 mins ago"));
        assert!(!is_recently_checked("59 mins ago"));
    }

    #[test]
    fn unrecognized_labels_are_stale() {
        assert!(!is_recently_checked(""));
        assert!(!is_recently_checked("1 hour ago"));
        assert!(!is_recently_checked("2 days ago"));
        assert!(!is_recently_checked("a few mins ago"));
        assert!(!is_recently_checked("-"));
    }

    #[test]
    fn elapsed_never_negative() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 10).unwrap();
        assert_eq!(elapsed_between(t0, t1), Duration::from_secs(10));
        assert_eq!(elapsed_between(t1, t0), Duration::ZERO);
    }

    #[test]
    fn uniform_duration_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = Duration::from_millis(500)..=Duration::from_secs(5);
        for _ in 0..200 {
            let d = uniform_duration(&mut rng, &range);
            assert!(range.contains(&d), "{:?} out of range", d);
        }
        let fixed = Duration::from_secs(2)..=Duration::from_secs(2);
        assert_eq!(uniform_duration(&mut rng, &fixed), Duration::from_secs(2));
    }
}
