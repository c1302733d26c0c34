//! HTTP retrieval with a stable, browser-like client identity.
//!
//! One [`HttpFetcher`] is built at startup and shared across every fetch in
//! the process: same User-Agent, same Accept headers, same Referer, reused
//! connections. The identity deliberately resembles a normal browser session
//! — a simple anti-blocking measure, not a guarantee. Rotating identities is
//! exactly what challenge pages key on.
//!
//! The pipeline and scheduler depend on the [`FetchHtml`] trait, not the
//! concrete client, so tests substitute an in-memory fake.

use crate::error::Result;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue, REFERER, USER_AGENT,
};
use std::time::Duration;
use tracing::{debug, instrument};

const UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                  (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Retrieval seam between the pipeline and the network.
pub trait FetchHtml {
    /// Fetch a page body. Fails on transport error, timeout, or non-2xx.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// The process-wide HTTP client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build the client identity once. The timeout bounds every individual
    /// request so a hung fetch cannot stall the scheduler for other flows.
    pub fn new(timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(UA));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ru-RU,ru;q=0.9,en-US;q=0.7,en;q=0.6"),
        );
        headers.insert(REFERER, HeaderValue::from_static("https://habr.com/"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }
}

impl FetchHtml for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        debug!(bytes = body.len(), "fetched page");
        Ok(body)
    }
}
