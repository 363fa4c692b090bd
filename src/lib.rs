//! # reqwest-proxy-crawler
//!
//! A polite polling crawler that fetches one page through a rotating pool of free proxies.
//!
//! The pool is scraped from a public proxy directory and liveness-probed on a fixed
//! interval. Each page fetch tries random proxies, dropping the ones that fail, and falls
//! back to a direct request once the pool runs dry. Matching items are announced through a
//! webhook, at most once per mute window, and the poll cadence speeds up during peak hours.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod gate;
pub mod middleware;
pub mod notifier;
pub mod parser;
pub mod pool;
pub mod proxy;
pub mod scheduler;
pub mod source;
pub mod transport;
mod utils;

#[cfg(test)]
mod testing;

pub use config::{CrawlerConfig, CrawlerConfigBuilder, PeakWindow};
pub use error::{ConfigError, DirectoryError, FetchError, NetworkError, NoProxyAvailable, NotifyError};
pub use fetcher::{Fetcher, FetchOutcome};
pub use gate::NotificationGate;
pub use middleware::RequestLogMiddleware;
pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
pub use parser::{matches, Item, ItemParser, ProductListingParser};
pub use pool::ProxyPool;
pub use proxy::Proxy;
pub use scheduler::PollScheduler;
pub use source::{DirectorySource, ProxySource};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
pub use utils::is_recently_checked;
