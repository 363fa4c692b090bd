//! Configuration for the crawler.

use crate::error::ConfigError;

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use std::ops::RangeInclusive;
use std::time::Duration;
use url::Url;

/// Default proxy directory page.
pub const DEFAULT_DIRECTORY_URL: &str = "https://www.sslproxies.org/";
/// Default liveness probe endpoint.
pub const DEFAULT_PROBE_URL: &str = "https://httpbin.org/ip";

/// Hours of the day, in a fixed UTC offset, during which polling speeds up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakWindow {
    /// First peak hour (inclusive).
    pub start_hour: u32,
    /// Hour at which peak ends (exclusive).
    pub end_hour: u32,
    /// Offset the hours are expressed in.
    pub offset: FixedOffset,
}

impl PeakWindow {
    /// Whether `now` falls inside the window.
    ///
    /// A window with `start_hour > end_hour` wraps past midnight; an empty
    /// window (`start_hour == end_hour`) never matches.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let hour = now.with_timezone(&self.offset).hour();
        if self.start_hour <= self.end_hour {
            self.start_hour <= hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Configuration for the crawler.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Page polled every cycle.
    pub root_url: String,
    /// Webhook receiving notifications. Notifications are only logged when unset.
    pub notifier_url: Option<String>,
    /// Lowercased keywords; an item matches if its title contains any of them.
    pub keywords: Vec<String>,
    /// How long an item stays muted after a notification.
    pub mute_duration: Duration,
    /// Wait between cycles outside the peak window.
    pub normal_wait: Duration,
    /// Range the wait is drawn from inside the peak window.
    pub peak_wait: RangeInclusive<Duration>,
    /// Random jitter added to every wait.
    pub jitter: RangeInclusive<Duration>,
    /// Peak window definition.
    pub peak_window: PeakWindow,
    /// Minimum time between two proxy pool refreshes.
    pub proxy_refresh_interval: Duration,
    /// Page listing candidate proxies.
    pub directory_url: String,
    /// Timeout for the directory fetch.
    pub directory_timeout: Duration,
    /// Endpoint used to check a candidate proxy forwards traffic.
    pub probe_url: String,
    /// Timeout for one liveness probe.
    pub probe_timeout: Duration,
    /// Number of liveness probes in flight at once.
    pub probe_concurrency: usize,
    /// Timeout for one page fetch attempt.
    pub page_fetch_timeout: Duration,
    /// Timeout for one notification request.
    pub notify_timeout: Duration,
    /// Maximum notifications sent per second.
    pub max_notifications_per_second: u32,
    /// Seed for the random source. Seeded from the OS when unset.
    pub rng_seed: Option<u64>,
}

impl CrawlerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }
}

/// Builder for `CrawlerConfig`.
pub struct CrawlerConfigBuilder {
    root_url: Option<String>,
    notifier_url: Option<String>,
    keywords: Vec<String>,
    mute_duration: Option<Duration>,
    normal_wait: Option<Duration>,
    peak_wait: Option<RangeInclusive<Duration>>,
    jitter: Option<RangeInclusive<Duration>>,
    peak_window: Option<(u32, u32, FixedOffset)>,
    proxy_refresh_interval: Option<Duration>,
    directory_url: Option<String>,
    directory_timeout: Option<Duration>,
    probe_url: Option<String>,
    probe_timeout: Option<Duration>,
    probe_concurrency: Option<usize>,
    page_fetch_timeout: Option<Duration>,
    notify_timeout: Option<Duration>,
    max_notifications_per_second: Option<u32>,
    rng_seed: Option<u64>,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            root_url: None,
            notifier_url: None,
            keywords: Vec::new(),
            mute_duration: None,
            normal_wait: None,
            peak_wait: None,
            jitter: None,
            peak_window: None,
            proxy_refresh_interval: None,
            directory_url: None,
            directory_timeout: None,
            probe_url: None,
            probe_timeout: None,
            probe_concurrency: None,
            page_fetch_timeout: None,
            notify_timeout: None,
            max_notifications_per_second: None,
            rng_seed: None,
        }
    }

    /// Set the page polled every cycle.
    pub fn root_url(mut self, url: impl Into<String>) -> Self {
        self.root_url = Some(url.into());
        self
    }

    /// Set the webhook receiving notifications.
    pub fn notifier_url(mut self, url: impl Into<String>) -> Self {
        self.notifier_url = Some(url.into());
        self
    }

    /// Set the keywords items are matched against (case-insensitive).
    pub fn keywords(mut self, keywords: Vec<impl Into<String>>) -> Self {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set how long an item stays muted after a notification.
    pub fn mute_duration(mut self, duration: Duration) -> Self {
        self.mute_duration = Some(duration);
        self
    }

    /// Set the wait between cycles outside the peak window.
    pub fn normal_wait(mut self, wait: Duration) -> Self {
        self.normal_wait = Some(wait);
        self
    }

    /// Set the range the wait is drawn from inside the peak window.
    pub fn peak_wait(mut self, range: RangeInclusive<Duration>) -> Self {
        self.peak_wait = Some(range);
        self
    }

    /// Set the jitter range added to every wait.
    pub fn jitter(mut self, range: RangeInclusive<Duration>) -> Self {
        self.jitter = Some(range);
        self
    }

    /// Set the peak window hours and the offset they are expressed in.
    pub fn peak_window(mut self, start_hour: u32, end_hour: u32, offset: FixedOffset) -> Self {
        self.peak_window = Some((start_hour, end_hour, offset));
        self
    }

    /// Set the minimum time between two proxy pool refreshes.
    pub fn proxy_refresh_interval(mut self, interval: Duration) -> Self {
        self.proxy_refresh_interval = Some(interval);
        self
    }

    /// Set the page listing candidate proxies.
    pub fn directory_url(mut self, url: impl Into<String>) -> Self {
        self.directory_url = Some(url.into());
        self
    }

    /// Set the timeout for the directory fetch.
    pub fn directory_timeout(mut self, timeout: Duration) -> Self {
        self.directory_timeout = Some(timeout);
        self
    }

    /// Set the liveness probe endpoint.
    pub fn probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = Some(url.into());
        self
    }

    /// Set the timeout for one liveness probe.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Set how many liveness probes may run at once.
    pub fn probe_concurrency(mut self, count: usize) -> Self {
        self.probe_concurrency = Some(count);
        self
    }

    /// Set the timeout for one page fetch attempt.
    pub fn page_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.page_fetch_timeout = Some(timeout);
        self
    }

    /// Set the timeout for one notification request.
    pub fn notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = Some(timeout);
        self
    }

    /// Set the maximum notifications sent per second.
    pub fn max_notifications_per_second(mut self, rate: u32) -> Self {
        self.max_notifications_per_second = Some(rate);
        self
    }

    /// Seed the random source for reproducible runs.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<CrawlerConfig, ConfigError> {
        let root_url = self.root_url.ok_or(ConfigError::MissingRootUrl)?;
        check_url("root url", &root_url)?;
        if let Some(url) = &self.notifier_url {
            check_url("notifier url", url)?;
        }
        let directory_url = self.directory_url.unwrap_or_else(|| DEFAULT_DIRECTORY_URL.to_string());
        check_url("directory url", &directory_url)?;
        let probe_url = self.probe_url.unwrap_or_else(|| DEFAULT_PROBE_URL.to_string());
        check_url("probe url", &probe_url)?;

        let (start_hour, end_hour, offset) = self.peak_window.unwrap_or_else(|| {
            let est = FixedOffset::west_opt(5 * 3600).unwrap_or_else(|| Utc.fix());
            (9, 18, est)
        });
        if start_hour > 24 || end_hour > 24 {
            return Err(ConfigError::InvalidPeakWindow { start: start_hour, end: end_hour });
        }

        let peak_wait = self
            .peak_wait
            .unwrap_or(Duration::from_secs(1)..=Duration::from_secs(5));
        if peak_wait.start() > peak_wait.end() {
            return Err(ConfigError::InvertedRange("peak wait"));
        }
        let jitter = self
            .jitter
            .unwrap_or(Duration::from_millis(500)..=Duration::from_secs(5));
        if jitter.start() > jitter.end() {
            return Err(ConfigError::InvertedRange("jitter"));
        }

        Ok(CrawlerConfig {
            root_url,
            notifier_url: self.notifier_url,
            keywords: self.keywords.iter().map(|k| k.to_lowercase()).collect(),
            mute_duration: self.mute_duration.unwrap_or(Duration::from_secs(10800)),
            normal_wait: self.normal_wait.unwrap_or(Duration::from_secs(300)),
            peak_wait,
            jitter,
            peak_window: PeakWindow { start_hour, end_hour, offset },
            proxy_refresh_interval: self.proxy_refresh_interval.unwrap_or(Duration::from_secs(3000)),
            directory_url,
            directory_timeout: self.directory_timeout.unwrap_or(Duration::from_secs(10)),
            probe_url,
            probe_timeout: self.probe_timeout.unwrap_or(Duration::from_secs(3)),
            probe_concurrency: self.probe_concurrency.unwrap_or(32).max(1),
            page_fetch_timeout: self.page_fetch_timeout.unwrap_or(Duration::from_secs(10)),
            notify_timeout: self.notify_timeout.unwrap_or(Duration::from_secs(10)),
            max_notifications_per_second: self.max_notifications_per_second.unwrap_or(1),
            rng_seed: self.rng_seed,
        })
    }
}

impl Default for CrawlerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn check_url(field: &'static str, url: &str) -> Result<(), ConfigError> {
    Url::parse(url)
        .map(|_| ())
        .map_err(|source| ConfigError::InvalidUrl { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio_test::{assert_err, assert_ok};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 14, hour, 30, 0).unwrap()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = assert_ok!(CrawlerConfig::builder().root_url("https://shop.example/new").build());
        assert_eq!(config.mute_duration, Duration::from_secs(10800));
        assert_eq!(config.normal_wait, Duration::from_secs(300));
        assert_eq!(config.peak_wait, Duration::from_secs(1)..=Duration::from_secs(5));
        assert_eq!(config.proxy_refresh_interval, Duration::from_secs(3000));
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert_eq!(config.page_fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.directory_url, DEFAULT_DIRECTORY_URL);
        assert_eq!(config.peak_window.start_hour, 9);
        assert_eq!(config.peak_window.end_hour, 18);
        assert!(config.notifier_url.is_none());
    }

    #[test]
    fn keywords_are_lowercased() {
        let config = CrawlerConfig::builder()
            .root_url("https://shop.example/")
            .keywords(vec!["Limited Edition", "COLLAB"])
            .build()
            .unwrap();
        assert_eq!(config.keywords, vec!["limited edition", "collab"]);
    }

    #[test]
    fn rejects_missing_or_invalid_urls() {
        assert!(matches!(CrawlerConfig::builder().build(), Err(ConfigError::MissingRootUrl)));
        let err = assert_err!(CrawlerConfig::builder()
            .root_url("https://shop.example/")
            .notifier_url("not a url")
            .build());
        assert!(matches!(err, ConfigError::InvalidUrl { field: "notifier url", .. }));
    }

    #[test]
    fn rejects_inverted_ranges_and_bad_hours() {
        let err = assert_err!(CrawlerConfig::builder()
            .root_url("https://shop.example/")
            .peak_wait(Duration::from_secs(5)..=Duration::from_secs(1))
            .build());
        assert!(matches!(err, ConfigError::InvertedRange("peak wait")));

        let err = assert_err!(CrawlerConfig::builder()
            .root_url("https://shop.example/")
            .peak_window(9, 25, Utc.fix())
            .build());
        assert!(matches!(err, ConfigError::InvalidPeakWindow { start: 9, end: 25 }));
    }

    #[test]
    fn peak_window_in_offset() {
        let window = PeakWindow {
            start_hour: 9,
            end_hour: 18,
            offset: FixedOffset::west_opt(5 * 3600).unwrap(),
        };
        // 14:30 UTC is 09:30 at UTC-5.
        assert!(window.contains(at(14)));
        // 23:30 UTC is 18:30 at UTC-5.
        assert!(!window.contains(at(23)));
        assert!(!window.contains(at(3)));
    }

    #[test]
    fn peak_window_wrapping_midnight() {
        let window = PeakWindow { start_hour: 22, end_hour: 2, offset: Utc.fix() };
        assert!(window.contains(at(23)));
        assert!(window.contains(at(1)));
        assert!(!window.contains(at(2)));
        assert!(!window.contains(at(12)));
    }

    #[test]
    fn empty_peak_window_never_matches() {
        let window = PeakWindow { start_hour: 6, end_hour: 6, offset: Utc.fix() };
        assert!((0..24).all(|h| !window.contains(at(h))));
    }
}
