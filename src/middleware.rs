//! Middleware implementation for reqwest.

use async_trait::async_trait;
use log::debug;
use reqwest_middleware::{Middleware, Next, Result};
use std::fmt;
use std::time::Instant;

/// Request extension naming the route a request takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Straight to the origin.
    Direct,
    /// Through the proxy with this address.
    Proxy(String),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Direct => f.write_str("direct"),
            Route::Proxy(addr) => write!(f, "via {}", addr),
        }
    }
}

/// Middleware that traces every outbound request: method, url, route, status and latency.
#[derive(Debug, Clone, Default)]
pub struct RequestLogMiddleware;

#[async_trait]
impl Middleware for RequestLogMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        extensions: &mut http::Extensions,
        next: Next<'_>,
    ) -> Result<reqwest::Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        let route = extensions.get::<Route>().cloned().unwrap_or(Route::Direct);
        let start = Instant::now();

        let result = next.run(req, extensions).await;

        match &result {
            Ok(response) => debug!(
                "{} {} ({}) -> {} in {:?}",
                method,
                url,
                route,
                response.status(),
                start.elapsed()
            ),
            Err(e) => debug!("{} {} ({}) failed after {:?}: {}", method, url, route, start.elapsed(), e),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_display() {
        assert_eq!(Route::Direct.to_string(), "direct");
        assert_eq!(Route::Proxy("10.0.0.1:3128".into()).to_string(), "via 10.0.0.1:3128");
    }
}
