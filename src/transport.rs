//! HTTP transport used for every GET the crawler issues.

use crate::error::NetworkError;
use crate::middleware::{RequestLogMiddleware, Route};
use crate::proxy::Proxy;

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use std::time::Duration;

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

impl HttpResponse {
    /// The body if the status is 2xx, a soft network error otherwise.
    pub fn into_success(self) -> Result<String, NetworkError> {
        if self.status.is_success() {
            Ok(self.body)
        } else {
            Err(NetworkError::Status(self.status))
        }
    }
}

/// Issues a single GET, optionally through a proxy, bounded by a timeout.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        proxy: Option<&Proxy>,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<HttpResponse, NetworkError>;
}

/// Transport backed by reqwest, with a fresh client per route.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        Self
    }

    fn client(proxy: Option<&Proxy>, timeout: Duration) -> Result<ClientWithMiddleware, NetworkError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        builder = match proxy {
            Some(proxy) => {
                let reqwest_proxy = proxy.to_reqwest_proxy().map_err(|source| NetworkError::InvalidProxy {
                    addr: proxy.addr().to_string(),
                    source,
                })?;
                builder.proxy(reqwest_proxy)
            }
            // Ignore proxies configured through the environment.
            None => builder.no_proxy(),
        };
        let client = builder.build().map_err(NetworkError::Client)?;

        Ok(ClientBuilder::new(client).with(RequestLogMiddleware).build())
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        proxy: Option<&Proxy>,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<HttpResponse, NetworkError> {
        let client = Self::client(proxy, timeout)?;
        let route = match proxy {
            Some(proxy) => Route::Proxy(proxy.addr().to_string()),
            None => Route::Direct,
        };

        let response = client
            .get(url)
            .headers(headers.clone())
            .with_extension(route)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await.map_err(NetworkError::Body)?;

        Ok(HttpResponse { status, body })
    }
}
