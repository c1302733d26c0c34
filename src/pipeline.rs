//! Per-flow ingestion pipeline: check the feed, materialize novel items.
//!
//! One run per flow per scheduler tick, in a fixed order:
//!
//! 1. Load the flow's persisted state.
//! 2. Fetch the listing and locate the newest item; if its id equals
//!    `last_seen_id`, stop with [`CheckOutcome::NoUpdate`] — no further
//!    network calls, no writes.
//! 3. Fetch the article page; reject challenge pages; extract the body text.
//! 4. Write the artifact file.
//! 5. Advance `last_seen_id` and save state.
//!
//! The artifact write strictly precedes the state save. That ordering is the
//! pipeline's one crash-safety invariant: a crash between the two writes
//! re-processes the same item next cycle (idempotent), whereas the opposite
//! order could skip an item forever. Any failure in steps 2–5 leaves state
//! untouched, so the same item is retried rather than silently dropped.

use crate::config::Flow;
use crate::error::{DigestError, Result};
use crate::fetch::FetchHtml;
use crate::models::{Article, CheckOutcome, FlowState};
use crate::scrape::{article, feed};
use crate::state::StateStore;
use std::path::PathBuf;
use tracing::{info, instrument, warn};
use url::Url;

/// Orchestrates one flow's check-and-materialize operation.
pub struct ArticlePipeline<F> {
    fetcher: F,
    store: StateStore,
    artifact_dir: PathBuf,
    debug_dir: PathBuf,
    block_markers: Vec<String>,
}

impl<F: FetchHtml> ArticlePipeline<F> {
    pub fn new(
        fetcher: F,
        store: StateStore,
        artifact_dir: impl Into<PathBuf>,
        debug_dir: impl Into<PathBuf>,
        block_markers: Vec<String>,
    ) -> Self {
        Self {
            fetcher,
            store,
            artifact_dir: artifact_dir.into(),
            debug_dir: debug_dir.into(),
            block_markers,
        }
    }

    /// Path of the flow's artifact file (title, url, blank line, body).
    pub fn artifact_path(&self, flow_name: &str) -> PathBuf {
        self.artifact_dir.join(format!("{flow_name}.txt"))
    }

    fn debug_path(&self, flow_name: &str) -> PathBuf {
        self.debug_dir.join(format!("{flow_name}.html"))
    }

    /// Run one check for one flow.
    #[instrument(level = "info", skip_all, fields(flow = %flow.name))]
    pub async fn check(&self, flow: &Flow) -> Result<CheckOutcome> {
        let state = self.store.load(&flow.name);

        let listing_html = self.fetcher.fetch(&flow.source_url).await?;
        let base = Url::parse(&flow.source_url)
            .map_err(|e| DigestError::FeedParse(format!("invalid source url: {e}")))?;
        let meta = feed::locate_latest(&listing_html, &base)?;

        if state.last_seen_id.as_deref() == Some(meta.id.as_str()) {
            info!(id = %meta.id, "newest item already seen");
            return Ok(CheckOutcome::NoUpdate);
        }

        let page_html = self.fetcher.fetch(&meta.url).await?;

        if article::looks_blocked(&page_html, &self.block_markers) {
            self.dump_page(&flow.name, &page_html).await;
            return Err(DigestError::Blocked);
        }

        let text = match article::extract_text(&page_html) {
            Ok(text) => text,
            Err(e) => {
                self.dump_page(&flow.name, &page_html).await;
                return Err(e);
            }
        };

        // Artifact before state: a crash here only re-processes this item.
        self.write_artifact(&flow.name, &meta.title, &meta.url, &text)
            .await?;

        self.store.save(
            &flow.name,
            &FlowState {
                last_seen_id: Some(meta.id.clone()),
            },
        )?;

        info!(id = %meta.id, title = %meta.title, "materialized new article");
        Ok(CheckOutcome::Updated(Article {
            flow: flow.name.clone(),
            id: meta.id,
            title: meta.title,
            url: meta.url,
            text,
        }))
    }

    async fn write_artifact(
        &self,
        flow_name: &str,
        title: &str,
        url: &str,
        text: &str,
    ) -> Result<()> {
        tokio::fs::create_dir_all(&self.artifact_dir).await?;
        let path = self.artifact_path(flow_name);
        let content = format!("{title}\n{url}\n\n{text}");
        tokio::fs::write(&path, content).await?;
        info!(path = %path.display(), "wrote artifact");
        Ok(())
    }

    /// Persist the raw fetched page for offline diagnosis. Best effort:
    /// the dump is a debugging aid, not part of the pipeline contract.
    async fn dump_page(&self, flow_name: &str, html: &str) {
        if let Err(e) = tokio::fs::create_dir_all(&self.debug_dir).await {
            warn!(flow = flow_name, error = %e, "cannot create debug dir");
            return;
        }
        let path = self.debug_path(flow_name);
        match tokio::fs::write(&path, html).await {
            Ok(()) => warn!(path = %path.display(), "dumped raw page for inspection"),
            Err(e) => warn!(flow = flow_name, error = %e, "failed to dump raw page"),
        }
    }
}
