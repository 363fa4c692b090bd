//! The poll loop.

use crate::config::CrawlerConfig;
use crate::error::NotifyError;
use crate::fetcher::Fetcher;
use crate::gate::NotificationGate;
use crate::notifier::{LogNotifier, Notifier, WebhookNotifier};
use crate::parser::{matches, ItemParser, ProductListingParser};
use crate::pool::ProxyPool;
use crate::source::{DirectorySource, ProxySource};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::utils::uniform_duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Owns all crawler state and runs one poll cycle at a time.
pub struct PollScheduler {
    config: CrawlerConfig,
    pool: ProxyPool,
    source: Box<dyn ProxySource>,
    fetcher: Fetcher,
    parser: Box<dyn ItemParser>,
    notifier: Box<dyn Notifier>,
    gate: NotificationGate,
    rng: StdRng,
}

impl PollScheduler {
    /// Create a scheduler talking to the real network.
    ///
    /// Notifications go to the configured webhook, or to the log when none is set.
    pub fn new(config: CrawlerConfig) -> Result<Self, NotifyError> {
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new());
        let source = DirectorySource::new(Arc::clone(&transport), &config);
        let notifier: Box<dyn Notifier> = match &config.notifier_url {
            Some(url) => Box::new(WebhookNotifier::new(
                url.clone(),
                config.notify_timeout,
                config.max_notifications_per_second,
            )?),
            None => Box::new(LogNotifier),
        };

        Ok(Self::with_components(
            config,
            transport,
            Box::new(source),
            Box::new(ProductListingParser),
            notifier,
        ))
    }

    /// Create a scheduler from explicit collaborators.
    pub fn with_components(
        config: CrawlerConfig,
        transport: Arc<dyn HttpTransport>,
        source: Box<dyn ProxySource>,
        parser: Box<dyn ItemParser>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            pool: ProxyPool::new(config.proxy_refresh_interval),
            fetcher: Fetcher::new(transport, config.page_fetch_timeout),
            gate: NotificationGate::new(config.mute_duration),
            source,
            parser,
            notifier,
            rng,
            config,
        }
    }

    /// Run one poll cycle at `now` and return how long to wait before the next one.
    ///
    /// Never fails: network and parsing faults only mean the cycle produces no items.
    pub async fn run_once(&mut self, now: DateTime<Utc>) -> Duration {
        self.pool.refresh_if_due(now, self.source.as_ref()).await;

        match self.fetcher.fetch(&self.config.root_url, &self.pool, &mut self.rng).await {
            Ok(html) => {
                self.dispatch(&html, now).await;
            }
            Err(e) => warn!("Cycle produced no items: {}", e),
        }

        self.next_wait(now)
    }

    /// Notify every matching, unmuted item on the page. Returns how many notifications went out.
    async fn dispatch(&mut self, html: &str, now: DateTime<Utc>) -> usize {
        let found: Vec<String> = self
            .parser
            .parse(html)
            .into_iter()
            .map(|item| item.title)
            .filter(|title| matches(title, &self.config.keywords))
            .collect();

        if found.is_empty() {
            info!("No desired items found");
            return 0;
        }

        let mut sent = 0;
        for item in found {
            if !self.gate.should_notify(&item, now) {
                info!("Item '{}' is muted. No notification sent", item);
                continue;
            }

            let message = format!("Matched item found: {}", item);
            match self.notifier.notify(&message).await {
                Ok(()) => {
                    self.gate.record_notified(&item, now);
                    sent += 1;
                    info!("Notification sent for item: {}", item);
                }
                Err(e) => warn!("Failed to send notification for item '{}': {}", item, e),
            }
        }
        sent
    }

    /// Wait before the next cycle: a short random wait inside the peak window,
    /// the normal wait outside it, plus random jitter either way.
    pub fn next_wait(&mut self, now: DateTime<Utc>) -> Duration {
        let base = if self.config.peak_window.contains(now) {
            uniform_duration(&mut self.rng, &self.config.peak_wait)
        } else {
            self.config.normal_wait
        };
        base + uniform_duration(&mut self.rng, &self.config.jitter)
    }

    /// Poll until `shutdown` resolves. Shutdown is observed while sleeping between cycles.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Polling {}", self.config.root_url);

        loop {
            let wait = self.run_once(Utc::now()).await;
            info!("Next poll in {:.1}s", wait.as_secs_f64());

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping poll loop");
                    return;
                }
            }
        }
    }

    pub fn pool(&self) -> &ProxyPool {
        &self.pool
    }

    pub fn gate(&self) -> &NotificationGate {
        &self.gate
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }
}
