//! Error types for the reqwest-proxy-crawler crate.

use http::StatusCode;
use thiserror::Error;

/// Error returned when no proxy is left in the pool.
#[derive(Debug, Error)]
#[error("No proxy available in pool")]
pub struct NoProxyAvailable;

/// A single HTTP call failed. Always recovered by the component that made the call.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The proxy address could not be turned into a reqwest proxy.
    #[error("invalid proxy address {addr}: {source}")]
    InvalidProxy {
        addr: String,
        #[source]
        source: reqwest::Error,
    },
    /// The HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    /// Timeout, refused connection, proxy handshake failure and friends.
    #[error("request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),
    /// The peer answered with a status the caller does not accept.
    #[error("unexpected status {0}")]
    Status(StatusCode),
    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
}

/// The proxy directory could not be fetched or did not have the expected shape.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to fetch proxy directory: {0}")]
    Fetch(#[from] NetworkError),
    #[error("proxy table not found in directory page")]
    MissingTable,
}

/// A logical page fetch failed on every route.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The pool ran dry and the direct request failed as well.
    #[error("no working proxies left and direct request failed: {0}")]
    Exhausted(#[source] NetworkError),
}

/// A notification could not be delivered.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to build notifier client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("notification request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("notification endpoint answered {0}")]
    Status(StatusCode),
}

/// Invalid crawler configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("root url is required")]
    MissingRootUrl,
    #[error("invalid {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid peak window {start}..{end}, hours must be within 0..=24")]
    InvalidPeakWindow { start: u32, end: u32 },
    #[error("{0} range minimum is greater than its maximum")]
    InvertedRange(&'static str),
}
