//! Alert delivery.
//!
//! A matched cycle pushes one alert through an [`AlertSink`]. Repeated matches
//! across cycles produce repeated alerts — there is no deduplication here.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Fixed notification text, mirroring the one-shot "word found" alert.
pub const ALERT_TITLE: &str = "Word found!";
pub const ALERT_BODY: &str = "The watched word appeared on the monitored page.";

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert request failed: {0}")]
    Request(String),
    #[error("alert endpoint returned non-success status: {0}")]
    Status(u16),
}

/// A destination for user-visible alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, title: &str, body: &str) -> Result<(), AlertError>;
}

#[derive(Serialize)]
struct AlertPayload<'a> {
    title: &'a str,
    body: &'a str,
}

/// Delivers alerts by POSTing a small JSON payload to a configured URL.
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    async fn notify(&self, title: &str, body: &str) -> Result<(), AlertError> {
        let response = self
            .client
            .post(&self.url)
            .json(&AlertPayload { title, body })
            .send()
            .await
            .map_err(|e| AlertError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Fallback sink when no webhook is configured: the alert becomes a log line,
/// so a bare setup still surfaces the match.
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn notify(&self, title: &str, body: &str) -> Result<(), AlertError> {
        warn!(title, body, "ALERT");
        Ok(())
    }
}

/// Picks the sink for a run: webhook when configured, log-only otherwise.
pub fn sink_from_config(webhook_url: Option<&str>) -> Arc<dyn AlertSink> {
    match webhook_url {
        Some(url) if !url.trim().is_empty() => Arc::new(WebhookSink::new(url.to_string())),
        _ => Arc::new(LogSink),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn webhook_sink_posts_json_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/alert"))
            .and(body_json(serde_json::json!({
                "title": ALERT_TITLE,
                "body": ALERT_BODY,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = WebhookSink::new(format!("{}/alert", server.uri()));
        sink.notify(ALERT_TITLE, ALERT_BODY).await.unwrap();
    }

    #[tokio::test]
    async fn webhook_sink_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sink = WebhookSink::new(server.uri());
        let err = sink.notify(ALERT_TITLE, ALERT_BODY).await.unwrap_err();
        assert!(matches!(err, AlertError::Status(500)));
    }

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        LogSink.notify(ALERT_TITLE, ALERT_BODY).await.unwrap();
    }

    #[tokio::test]
    async fn repeated_notifies_produce_repeated_alerts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(3)
            .mount(&server)
            .await;

        let sink = WebhookSink::new(server.uri());
        for _ in 0..3 {
            sink.notify(ALERT_TITLE, ALERT_BODY).await.unwrap();
        }
    }
}
