//! Multi-flow scheduling loop.
//!
//! Drives every configured flow, forever, strictly sequentially. Sequential
//! processing is deliberate: it bounds load on the upstream site and keeps
//! the block-detection risk predictable, at the cost of cycle latency
//! scaling with flow count.
//!
//! Fault isolation happens here, at the flow boundary: whatever a single
//! flow's run raises — fetch, parse, block, extraction, persistence — is
//! logged with the flow name and the cycle moves on to the next flow. The
//! process only ever exits for startup configuration errors, never for a
//! flow failure.
//!
//! Timing is jittered twice: a random delay before each flow (so flows don't
//! burst near-simultaneous requests) and a `base ± jitter` sleep between
//! cycles. Sleeping goes through the [`Sleep`] trait so tests run whole
//! cycles without wall-clock delays.

use crate::api::Summarize;
use crate::config::{Flow, PacingConfig};
use crate::error::{DigestError, Result};
use crate::fetch::FetchHtml;
use crate::models::{Article, CheckOutcome};
use crate::pipeline::ArticlePipeline;
use crate::publish::Publish;
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use std::error::Error;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Sleep seam so tests can run cycles without real delays.
pub trait Sleep {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeping via the tokio timer.
#[derive(Debug, Default)]
pub struct TokioSleep;

impl Sleep for TokioSleep {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Result of one flow's run within a cycle.
#[derive(Debug)]
pub struct FlowRun {
    pub flow: String,
    pub result: Result<CheckOutcome>,
}

/// Drives the per-flow pipeline across all configured flows.
pub struct Scheduler<F, Z, P, S> {
    flows: Vec<Flow>,
    pipeline: ArticlePipeline<F>,
    summarizer: Z,
    publisher: Option<P>,
    sleeper: S,
    pacing: PacingConfig,
}

impl<F, Z, P, S> Scheduler<F, Z, P, S>
where
    F: FetchHtml,
    Z: Summarize,
    P: Publish,
    S: Sleep,
{
    pub fn new(
        flows: Vec<Flow>,
        pipeline: ArticlePipeline<F>,
        summarizer: Z,
        publisher: Option<P>,
        sleeper: S,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            flows,
            pipeline,
            summarizer,
            publisher,
            sleeper,
            pacing,
        }
    }

    /// Run forever: one full cycle over all flows, then sleep, repeat.
    pub async fn run(&self) {
        let mut cycle = 0u64;
        loop {
            cycle += 1;
            info!(cycle, flows = self.flows.len(), "cycle starting");
            let runs = self.run_cycle().await;

            let updated = runs
                .iter()
                .filter(|run| matches!(run.result, Ok(CheckOutcome::Updated(_))))
                .count();
            let failed: Vec<&str> = runs
                .iter()
                .filter(|run| run.result.is_err())
                .map(|run| run.flow.as_str())
                .collect();

            let pause = self.cycle_pause();
            info!(
                cycle,
                total = runs.len(),
                updated,
                failed = ?failed,
                ?pause,
                "cycle complete; sleeping"
            );
            self.sleeper.sleep(pause).await;
        }
    }

    /// Process every configured flow exactly once, in order.
    ///
    /// Returns per-flow results; the forever loop logs a summary of them,
    /// tests assert on them directly.
    pub async fn run_cycle(&self) -> Vec<FlowRun> {
        let mut runs = Vec::with_capacity(self.flows.len());
        for flow in &self.flows {
            self.sleeper.sleep(self.flow_pause()).await;
            let result = self.run_flow(flow).await;
            runs.push(FlowRun {
                flow: flow.name.clone(),
                result,
            });
        }
        runs
    }

    /// One flow: pipeline run, then delivery if something new materialized.
    /// Errors stop at this boundary.
    #[instrument(level = "info", skip_all, fields(flow = %flow.name))]
    async fn run_flow(&self, flow: &Flow) -> Result<CheckOutcome> {
        let outcome = match self.pipeline.check(flow).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if matches!(e, DigestError::Persistence(_)) {
                    // The artifact may already be on disk; the next cycle
                    // re-detects the item and overwrites it.
                    error!(flow = %flow.name, error = %e, "state not advanced; run will be retried");
                } else {
                    error!(flow = %flow.name, error = %e, "flow check failed");
                }
                return Err(e);
            }
        };

        match &outcome {
            CheckOutcome::NoUpdate => info!("no new items"),
            CheckOutcome::Updated(article) => {
                // Delivery failures are collaborator failures: reported and
                // isolated, never rolling back the committed pipeline state.
                if let Err(e) = self.deliver(flow, article).await {
                    error!(flow = %flow.name, error = %e, "delivery failed");
                }
            }
        }
        Ok(outcome)
    }

    /// Summarize the artifact, persist the generated post, publish it.
    async fn deliver(&self, flow: &Flow, article: &Article) -> std::result::Result<(), Box<dyn Error>> {
        let artifact_path = self.pipeline.artifact_path(&flow.name);
        let raw = tokio::fs::read_to_string(&artifact_path).await?;

        let summary = self.summarizer.summarize(&raw).await?;
        info!(preview = %truncate_for_log(&summary, 200), "summary ready");

        let post_path = artifact_path.with_extension("post.txt");
        tokio::fs::write(&post_path, &summary).await?;
        info!(path = %post_path.display(), "wrote generated post");

        let Some(publisher) = &self.publisher else {
            info!("publishing not configured; skipping");
            return Ok(());
        };

        let final_text = format!("{summary}\n\n{url}", url = article.url);
        publisher.publish(&flow.channel_key, &final_text).await?;
        info!(channel = %flow.channel_key, "published digest");
        Ok(())
    }

    /// Random pre-flow delay within the configured bounds.
    fn flow_pause(&self) -> Duration {
        let secs =
            rng().random_range(self.pacing.flow_delay_min_secs..=self.pacing.flow_delay_max_secs);
        Duration::from_secs(secs)
    }

    /// Cycle sleep drawn uniformly from `base ± jitter`, floored at zero.
    fn cycle_pause(&self) -> Duration {
        let base = self.pacing.cycle_secs as i64;
        let jitter = self.pacing.cycle_jitter_secs as i64;
        let offset = if jitter > 0 {
            rng().random_range(-jitter..=jitter)
        } else {
            0
        };
        Duration::from_secs((base + offset).max(0) as u64)
    }
}
