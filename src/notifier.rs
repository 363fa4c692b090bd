//! Delivery of match notifications.

use crate::error::NotifyError;
use crate::middleware::RequestLogMiddleware;

use async_trait::async_trait;
use governor::{clock::DefaultClock, middleware::NoOpMiddleware, state::{InMemoryState, NotKeyed}, Quota, RateLimiter};
use http::header::CONTENT_TYPE;
use log::info;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::Serialize;
use std::num::NonZeroU32;
use std::time::Duration;

/// Sends a text message somewhere a human will see it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Posts `{"text": message}` to an incoming-webhook URL.
pub struct WebhookNotifier {
    client: ClientWithMiddleware,
    url: String,
    /// Keeps bursts of matches under the webhook's rate limit.
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration, max_per_second: u32) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NotifyError::Client)?;
        let quota = Quota::per_second(NonZeroU32::new(max_per_second).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client: ClientBuilder::new(client).with(RequestLogMiddleware).build(),
            url: url.into(),
            limiter: RateLimiter::direct(quota),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.limiter.until_ready().await;

        let body = serde_json::to_vec(&WebhookPayload { text: message })?;
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status));
        }
        info!("Webhook notification sent successfully");
        Ok(())
    }
}

/// Notifier that only writes to the log, used when no webhook is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        info!("{}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_text_object() {
        let json = serde_json::to_string(&WebhookPayload { text: "Matched item found: Shoe" }).unwrap();
        assert_eq!(json, r#"{"text":"Matched item found: Shoe"}"#);
    }

    #[tokio::test]
    async fn malformed_webhook_url_is_a_request_error() {
        // Rejected while building the request, before any connection is attempted.
        let notifier = WebhookNotifier::new("not a url", Duration::from_secs(2), 5).unwrap();
        assert!(matches!(notifier.notify("hi").await, Err(NotifyError::Request(_))));
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        assert!(LogNotifier.notify("hello").await.is_ok());
    }
}
