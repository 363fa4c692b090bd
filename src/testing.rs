//! Scripted collaborators for unit tests.

use crate::error::{NetworkError, NotifyError};
use crate::notifier::Notifier;
use crate::proxy::Proxy;
use crate::source::ProxySource;
use crate::transport::{HttpResponse, HttpTransport};

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One recorded GET.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub url: String,
    pub proxy: Option<String>,
    pub user_agent: Option<String>,
    pub timeout: Duration,
}

/// Transport answering from a fixed route table. Unknown routes fail like a refused connection.
#[derive(Default)]
pub struct MockTransport {
    routes: HashMap<(String, Option<String>), (StatusCode, String)>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, proxy: Option<&str>, status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.routes
            .insert((url.to_string(), proxy.map(str::to_string)), (status, body.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn proxied_calls(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.proxy.is_some()).count()
    }

    pub fn direct_calls(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.proxy.is_none()).count()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(
        &self,
        url: &str,
        proxy: Option<&Proxy>,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<HttpResponse, NetworkError> {
        let proxy = proxy.map(|p| p.addr().to_string());
        self.calls.lock().push(Call {
            url: url.to_string(),
            proxy: proxy.clone(),
            user_agent: headers
                .get(http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            timeout,
        });

        match self.routes.get(&(url.to_string(), proxy)) {
            Some((status, body)) => Ok(HttpResponse { status: *status, body: body.clone() }),
            None => Err(NetworkError::Status(StatusCode::BAD_GATEWAY)),
        }
    }
}

/// Source handing out the same list on every refresh.
pub struct StaticSource {
    proxies: Vec<Proxy>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(addrs: &[&str]) -> Self {
        Self {
            proxies: addrs.iter().map(|a| Proxy::new(*a)).collect(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProxySource for StaticSource {
    async fn fetch_candidates(&self) -> Vec<Proxy> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.proxies.clone()
    }
}

#[async_trait]
impl<S: ProxySource + ?Sized> ProxySource for Arc<S> {
    async fn fetch_candidates(&self) -> Vec<Proxy> {
        (**self).fetch_candidates().await
    }
}

/// Notifier keeping every message it was asked to send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every send fails.
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Status(StatusCode::SERVICE_UNAVAILABLE));
        }
        self.sent.lock().push(message.to_string());
        Ok(())
    }
}
