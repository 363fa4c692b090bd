//! Single logical page fetch with proxy rotation and direct fallback.

use crate::error::{FetchError, NetworkError};
use crate::pool::ProxyPool;
use crate::proxy::Proxy;
use crate::transport::HttpTransport;

use http::header::{HeaderValue, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, PRAGMA, REFERER, USER_AGENT};
use http::HeaderMap;
use log::{info, warn};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Browser signatures rotated across fetches.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; WOW64) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:92.0) Gecko/20100101 Firefox/92.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.141 Safari/537.36",
    "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.131 Mobile Safari/537.36",
    "Mozilla/5.0 (Windows NT 6.1; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.1 Safari/605.1.15",
    "Mozilla/5.0 (iPad; CPU OS 14_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 10; SM-G973F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.96 Mobile Safari/537.36",
    "Mozilla/5.0 (Windows NT 6.3; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.93 Safari/537.36",
    "Mozilla/5.0 (Linux; Android 9; ONEPLUS A6000) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.152 Mobile Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 11_2_3) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.90 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; ARM64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/89.0.4389.114 Safari/537.36",
    "Mozilla/5.0 (Linux; U; Android 8.0.0; en-us; Nexus 5 Build/OPR6.170623.017) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.98 Mobile Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Linux; Android 11; SM-N975U) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Mobile Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.1 Safari/605.1.15",
];

/// Result of one logical page fetch: the page body or the reason every route failed.
pub type FetchOutcome = Result<String, FetchError>;

/// Header set resembling an organic browser visit, with a randomly chosen User-Agent.
pub fn browser_headers<R: Rng + ?Sized>(rng: &mut R) -> HeaderMap {
    let user_agent = USER_AGENTS[rng.random_range(0..USER_AGENTS.len())];

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(REFERER, HeaderValue::from_static("https://www.google.com"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

/// Fetches pages through the pool, shrinking it as proxies fail.
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Fetch `url`, trying random proxies until one succeeds or the pool is empty,
    /// then falling back to a single direct request.
    ///
    /// Each failed proxy is removed from `pool`. Only the direct attempt's failure
    /// is reported to the caller.
    pub async fn fetch<R: Rng + ?Sized>(&self, url: &str, pool: &ProxyPool, rng: &mut R) -> FetchOutcome {
        let headers = browser_headers(rng);

        while let Ok(proxy) = pool.pick_random(rng) {
            match self.get(url, Some(&proxy), &headers).await {
                Ok(body) => {
                    info!("Successfully fetched data using proxy: {}", proxy);
                    return Ok(body);
                }
                Err(e) => {
                    warn!("Proxy {} failed: {}. Removing it from the pool", proxy, e);
                    pool.remove(&proxy);
                }
            }
        }

        info!("No working proxies left. Falling back to direct request");
        match self.get(url, None, &headers).await {
            Ok(body) => {
                info!("Successfully fetched data without proxy");
                Ok(body)
            }
            Err(e) => Err(FetchError::Exhausted(e)),
        }
    }

    async fn get(&self, url: &str, proxy: Option<&Proxy>, headers: &HeaderMap) -> Result<String, NetworkError> {
        self.transport
            .get(url, proxy, headers, self.timeout)
            .await?
            .into_success()
    }
}
