//! Proxy representation.

use std::fmt;

/// An outbound proxy, identified by its address alone.
///
/// Bare `host:port` addresses are treated as plain HTTP proxies. Addresses that
/// already carry a scheme (e.g. `socks5://127.0.0.1:1080`) are used as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Proxy {
    addr: String,
}

impl Proxy {
    /// Create a proxy from an address such as `"203.0.113.7:8080"`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into().trim().to_string(),
        }
    }

    /// The address this proxy was created from.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The proxy URL handed to reqwest.
    pub fn url(&self) -> String {
        if self.addr.contains("://") {
            self.addr.clone()
        } else {
            format!("http://{}", self.addr)
        }
    }

    /// Convert the proxy URL to a reqwest::Proxy routing all schemes.
    pub fn to_reqwest_proxy(&self) -> Result<reqwest::Proxy, reqwest::Error> {
        reqwest::Proxy::all(self.url())
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.addr)
    }
}
