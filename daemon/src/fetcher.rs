//! Page fetching: HTTP GET plus HTML-to-visible-text extraction.
//!
//! One attempt per call — retry is the scheduler's concern (currently: the
//! next tick is the retry).

use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("webwatch/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("HTTP {0} for: {1}")]
    Status(u16, String),
}

/// Fetches pages and strips them down to their visible text.
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Fetches `url` and returns the page's visible text, tags stripped and
    /// whitespace normalized.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        validate_url(url)?;

        debug!(url, "Fetching page");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16(), url.to_string()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(extract_text(&html))
    }
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects anything that is not an absolute http(s) URL.
fn validate_url(url: &str) -> Result<(), FetchError> {
    let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
    if !["http", "https"].contains(&parsed.scheme()) {
        return Err(FetchError::InvalidUrl(url.to_string()));
    }
    Ok(())
}

/// Extracts the document's visible text: body text nodes joined by spaces,
/// runs of whitespace collapsed.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let body_selector = Selector::parse("body").expect("static selector");
    let raw = match document.select(&body_selector).next() {
        Some(body) => body.text().collect::<Vec<_>>().join(" "),
        None => String::new(),
    };

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
