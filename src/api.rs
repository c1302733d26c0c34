//! Summarization via an OpenAI-compatible chat-completions API, with
//! exponential backoff retry.
//!
//! The scheduler depends on the [`Summarize`] trait; [`ChatApi`] is the real
//! HTTP client and [`Retry`] is a decorator that adds backoff to any
//! implementation. Compose them once at startup:
//!
//! ```ignore
//! let summarizer = Retry::new(ChatApi::new(url, key, model), 5, Duration::from_secs(1));
//! ```
//!
//! Retry delays follow `min(base * 2^(attempt-1), 30s) + jitter(0..250ms)`.

use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::utils::truncate_for_log;

/// Editorial instructions for the digest posts.
const SYSTEM_PROMPT: &str = "\
Ты русский редактор, пишущий на русском языке. Пиши как можно лаконичней, только основную суть.

ФОРМАТ ВЫВОДА (строго):
- Первая строка: заголовок статьи (БЕЗ двоеточия, обрамлена *)
- Далее пустая строка
- Далее 2–4 абзаца текста. Каждый не более 40 слов.

НЕ ДОБАВЛЯЙ вводных слов:
\"Пост-выжимка\", \"Кратко\", \"Резюме\", \"Вывод\".";

/// Summarization seam between the scheduler and the LLM backend.
pub trait Summarize {
    /// Turn raw article text into a short digest post.
    async fn summarize(&self, text: &str) -> Result<String, Box<dyn Error>>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

/// Chat-completions client.
pub struct ChatApi {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl ChatApi {
    /// `api_url` is the full completions endpoint, not a base URL.
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http,
            api_url,
            api_key,
            model,
        }
    }
}

impl fmt::Debug for ChatApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // api_key intentionally omitted
        f.debug_struct("ChatApi")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

impl Summarize for ChatApi {
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, text: &str) -> Result<String, Box<dyn Error>> {
        let user_content = format!("Текст статьи:\n\n{text}");
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
        };

        let t0 = Instant::now();
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                %status,
                elapsed_ms = t0.elapsed().as_millis() as u128,
                body = %truncate_for_log(&body, 300),
                "summarization API returned an error"
            );
            return Err(format!("summarization API error ({status}): {body}").into());
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or("summarization API returned no choices")?;

        info!(
            elapsed_ms = t0.elapsed().as_millis() as u128,
            chars = content.len(),
            "summary generated"
        );
        Ok(content.trim().to_string())
    }
}

/// Decorator that adds exponential backoff retry to any [`Summarize`]
/// implementation. Transient API failures (rate limits, network blips,
/// 5xx) are retried; the last error is returned once attempts run out.
pub struct Retry<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> Retry<T>
where
    T: Summarize,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for Retry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retry")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Summarize for Retry<T>
where
    T: Summarize + fmt::Debug,
{
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, text: &str) -> Result<String, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.summarize(text).await {
                Ok(summary) => return Ok(summary),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u128,
                            error = %e,
                            "summarize() exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "summarize() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails `failures` times, then succeeds.
    #[derive(Debug)]
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl Summarize for Flaky {
        async fn summarize(&self, _text: &str) -> Result<String, Box<dyn Error>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err("transient".into())
            } else {
                Ok("summary".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let retry = Retry::new(
            Flaky {
                failures: 2,
                calls: AtomicUsize::new(0),
            },
            5,
            Duration::from_millis(1),
        );
        let out = retry.summarize("text").await.unwrap();
        assert_eq!(out, "summary");
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let retry = Retry::new(
            Flaky {
                failures: usize::MAX,
                calls: AtomicUsize::new(0),
            },
            2,
            Duration::from_millis(1),
        );
        let err = retry.summarize("text").await.unwrap_err();
        assert_eq!(err.to_string(), "transient");
        // initial attempt + 2 retries
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_chat_api_debug_hides_key() {
        let api = ChatApi::new(
            "https://example/v1/chat/completions".to_string(),
            "secret-key".to_string(),
            "test-model".to_string(),
        );
        let printed = format!("{api:?}");
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains("test-model"));
    }

    #[test]
    fn test_chat_request_serialization_shape() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }
}
