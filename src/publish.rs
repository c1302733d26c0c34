//! Posting digests to Telegram channels.
//!
//! The scheduler depends on the [`Publish`] trait; [`TelegramPublisher`] is
//! the Bot API implementation. A flow's `channel_key` is the chat id of its
//! destination channel and is passed through opaquely — nothing in the core
//! interprets it.

use serde_json::json;
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

/// Publishing seam between the scheduler and the delivery channel.
pub trait Publish {
    /// Deliver `text` to the destination identified by `channel_key`.
    async fn publish(&self, channel_key: &str, text: &str) -> Result<(), Box<dyn Error>>;
}

/// Telegram Bot API publisher (`sendMessage`).
pub struct TelegramPublisher {
    http: reqwest::Client,
    token: String,
}

impl TelegramPublisher {
    pub fn new(token: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self { http, token }
    }

    fn endpoint(&self) -> String {
        format!("https://api.telegram.org/bot{}/sendMessage", self.token)
    }
}

impl fmt::Debug for TelegramPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // token intentionally omitted
        f.debug_struct("TelegramPublisher").finish()
    }
}

impl Publish for TelegramPublisher {
    #[instrument(level = "info", skip_all, fields(channel = %channel_key))]
    async fn publish(&self, channel_key: &str, text: &str) -> Result<(), Box<dyn Error>> {
        let body = json!({
            "chat_id": channel_key,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self.http.post(self.endpoint()).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(format!("Telegram API error ({status}): {detail}").into());
        }

        info!(chars = text.len(), "posted message");
        Ok(())
    }
}
