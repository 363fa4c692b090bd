//! Candidate proxy discovery: directory scraping and liveness probing.

use crate::config::CrawlerConfig;
use crate::error::{DirectoryError, NetworkError};
use crate::proxy::Proxy;
use crate::transport::HttpTransport;
use crate::utils::is_recently_checked;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use http::{HeaderMap, StatusCode};
use log::{debug, info, warn};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.table.table-striped.table-bordered").expect("static selector"));
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody tr").expect("static selector"));
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("static selector"));

/// Supplies validated proxies for a pool refresh.
#[async_trait]
pub trait ProxySource: Send + Sync {
    /// Fetch and validate candidates. Failures yield an empty list.
    async fn fetch_candidates(&self) -> Vec<Proxy>;
}

/// One row of the proxy directory table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRow {
    pub proxy: Proxy,
    pub https: bool,
    pub last_checked: String,
}

impl DirectoryRow {
    /// HTTPS capable and verified recently by the directory.
    pub fn is_candidate(&self) -> bool {
        self.https && is_recently_checked(&self.last_checked)
    }
}

/// Parse the directory page into rows.
pub fn parse_directory(html: &str) -> Result<Vec<DirectoryRow>, DirectoryError> {
    let document = Html::parse_document(html);
    let table = document.select(&TABLE).next().ok_or(DirectoryError::MissingTable)?;

    let rows = table
        .select(&ROW)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&CELL).map(cell_text).collect();
            if cells.len() < 8 {
                return None;
            }
            Some(DirectoryRow {
                proxy: Proxy::new(format!("{}:{}", cells[0], cells[1])),
                https: cells[6].eq_ignore_ascii_case("yes"),
                last_checked: cells[7].to_lowercase(),
            })
        })
        .collect();

    Ok(rows)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Proxy source scraping a public directory page and probing every candidate.
pub struct DirectorySource {
    transport: Arc<dyn HttpTransport>,
    directory_url: String,
    directory_timeout: Duration,
    probe_url: String,
    probe_timeout: Duration,
    probe_concurrency: usize,
}

impl DirectorySource {
    /// Create a source using the directory and probe settings of `config`.
    pub fn new(transport: Arc<dyn HttpTransport>, config: &CrawlerConfig) -> Self {
        Self {
            transport,
            directory_url: config.directory_url.clone(),
            directory_timeout: config.directory_timeout,
            probe_url: config.probe_url.clone(),
            probe_timeout: config.probe_timeout,
            probe_concurrency: config.probe_concurrency.max(1),
        }
    }

    /// Fetch the directory and keep recent HTTPS-capable, de-duplicated entries.
    pub async fn list_candidates(&self) -> Result<Vec<Proxy>, DirectoryError> {
        let html = self
            .transport
            .get(&self.directory_url, None, &HeaderMap::new(), self.directory_timeout)
            .await
            .and_then(|response| response.into_success())?;
        let rows = parse_directory(&html)?;
        let total = rows.len();

        let mut seen = HashSet::new();
        let candidates: Vec<Proxy> = rows
            .into_iter()
            .filter(DirectoryRow::is_candidate)
            .map(|row| row.proxy)
            .filter(|proxy| seen.insert(proxy.clone()))
            .collect();

        debug!("{} of {} directory entries are fresh HTTPS candidates", candidates.len(), total);
        Ok(candidates)
    }

    /// Check that `proxy` forwards a request to the probe endpoint.
    pub async fn probe(&self, proxy: &Proxy) -> bool {
        match self
            .transport
            .get(&self.probe_url, Some(proxy), &HeaderMap::new(), self.probe_timeout)
            .await
        {
            Ok(response) if response.status == StatusCode::OK => true,
            Ok(response) => {
                debug!("Proxy {} failed liveness probe: {}", proxy, NetworkError::Status(response.status));
                false
            }
            Err(e) => {
                debug!("Proxy {} failed liveness probe: {}", proxy, e);
                false
            }
        }
    }
}

#[async_trait]
impl ProxySource for DirectorySource {
    async fn fetch_candidates(&self) -> Vec<Proxy> {
        let candidates = match self.list_candidates().await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Error fetching proxy list from {}: {}", self.directory_url, e);
                return Vec::new();
            }
        };

        let checked = candidates.len();
        let valid: Vec<Proxy> = stream::iter(candidates)
            .map(|proxy| async move {
                let alive = self.probe(&proxy).await;
                (proxy, alive)
            })
            .buffered(self.probe_concurrency)
            .filter_map(|(proxy, alive)| async move { alive.then_some(proxy) })
            .collect()
            .await;

        info!("Fetched {} working proxies out of {} candidates", valid.len(), checked);
        valid
    }
}
