//! Core proxy pool implementation.

use crate::error::NoProxyAvailable;
use crate::proxy::Proxy;
use crate::source::ProxySource;
use crate::utils::elapsed_between;

use chrono::{DateTime, Utc};
use log::{info, warn};
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

/// The set of proxies currently trusted for outbound requests.
///
/// The member list is replaced wholesale on refresh and shrinks one proxy at a
/// time as fetches through them fail. Readers never see a half-applied refresh.
pub struct ProxyPool {
    /// Proxies that passed the liveness probe of the last refresh.
    proxies: RwLock<Vec<Proxy>>,
    /// When the last refresh happened, `None` before the first one.
    last_refreshed: Mutex<Option<DateTime<Utc>>>,
    /// Minimum time between two refreshes.
    refresh_interval: Duration,
    /// Held across the due check and the fetch so concurrent callers refresh once.
    refresh_lock: AsyncMutex<()>,
}

impl ProxyPool {
    /// Create an empty pool that becomes due for refresh immediately.
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            proxies: RwLock::new(Vec::new()),
            last_refreshed: Mutex::new(None),
            refresh_interval,
            refresh_lock: AsyncMutex::new(()),
        }
    }

    /// Whether a refresh is due at `now`.
    pub fn is_refresh_due(&self, now: DateTime<Utc>) -> bool {
        match *self.last_refreshed.lock() {
            Some(last) => elapsed_between(last, now) >= self.refresh_interval,
            None => true,
        }
    }

    /// Replace the pool with fresh candidates from `source` if the refresh interval has passed.
    ///
    /// Returns whether a refresh took place. Concurrent callers within the same
    /// interval wait for the first one and then see the refresh as done.
    pub async fn refresh_if_due(&self, now: DateTime<Utc>, source: &dyn ProxySource) -> bool {
        let _refreshing = self.refresh_lock.lock().await;
        if !self.is_refresh_due(now) {
            return false;
        }

        info!("Refreshing proxies...");
        let fresh = source.fetch_candidates().await;
        if fresh.is_empty() {
            warn!("Proxy refresh produced no working proxies");
        }
        self.replace(fresh);
        *self.last_refreshed.lock() = Some(now);

        true
    }

    /// Atomically replace every member of the pool, dropping duplicate addresses.
    pub fn replace(&self, proxies: Vec<Proxy>) {
        let mut deduped: Vec<Proxy> = Vec::with_capacity(proxies.len());
        for proxy in proxies {
            if !deduped.contains(&proxy) {
                deduped.push(proxy);
            }
        }

        let count = deduped.len();
        *self.proxies.write() = deduped;
        info!("Proxy pool now holds {} proxies", count);
    }

    /// Pick a member uniformly at random.
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Proxy, NoProxyAvailable> {
        let proxies = self.proxies.read();
        if proxies.is_empty() {
            return Err(NoProxyAvailable);
        }
        let idx = rng.random_range(0..proxies.len());
        Ok(proxies[idx].clone())
    }

    /// Drop `proxy` from the pool. Returns whether it was a member.
    pub fn remove(&self, proxy: &Proxy) -> bool {
        let mut proxies = self.proxies.write();
        match proxies.iter().position(|p| p == proxy) {
            Some(idx) => {
                proxies.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the current members.
    pub fn proxies(&self) -> Vec<Proxy> {
        self.proxies.read().clone()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.proxies.read().len()
    }

    /// Whether the pool has no members left.
    pub fn is_empty(&self) -> bool {
        self.proxies.read().is_empty()
    }

    /// When the last refresh happened.
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        *self.last_refreshed.lock()
    }
}
