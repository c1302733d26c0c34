//! # Flow Digest
//!
//! A feed watcher and digest pipeline: it polls article listing pages
//! ("flows"), detects when a new post appears, extracts the post's text,
//! summarizes it through an OpenAI-compatible LLM API, and publishes the
//! digest to the flow's Telegram channel.
//!
//! ## Usage
//!
//! ```sh
//! LITELLM_API_KEY=sk-... BOT_TOKEN=123:abc flow_digest -c config.yaml
//! ```
//!
//! ## Architecture
//!
//! One cycle of the forever-loop, per flow:
//! 1. **Check**: fetch the listing, locate the newest item, compare it to
//!    the persisted `last_seen_id`
//! 2. **Materialize**: fetch the article, reject challenge pages, extract
//!    the body, write the artifact, advance state
//! 3. **Deliver**: summarize the artifact and post the digest
//!
//! Flows run strictly sequentially with jittered pacing; a failure in one
//! flow never aborts the others.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod pipeline;
mod publish;
mod scheduler;
mod scrape;
mod state;
mod utils;

use api::{ChatApi, Retry};
use cli::Cli;
use config::Config;
use fetch::HttpFetcher;
use pipeline::ArticlePipeline;
use publish::TelegramPublisher;
use scheduler::{Scheduler, TokioSleep};
use state::StateStore;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("flow_digest starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.state_dir, ?args.artifact_dir, "Parsed CLI arguments");

    let config = match Config::load(Path::new(&args.config)) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %args.config, error = %e, "Configuration is invalid; refusing to start");
            return Err(e);
        }
    };
    info!(flows = config.flows.len(), path = %args.config, "Loaded configuration");

    // Early check: every output directory must be writable before the loop
    // starts; permission problems at 3 AM mid-cycle help nobody.
    for dir in [&args.state_dir, &args.artifact_dir, &args.debug_dir] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable (fix perms or choose a different path)");
            return Err(e);
        }
    }

    let fetcher = HttpFetcher::new(Duration::from_secs(config.fetch_timeout_secs));
    let store = StateStore::new(&args.state_dir);
    let pipeline = ArticlePipeline::new(
        fetcher,
        store,
        &args.artifact_dir,
        &args.debug_dir,
        config.block_markers.clone(),
    );

    let summarizer = Retry::new(
        ChatApi::new(args.api_url.clone(), args.api_key.clone(), args.model.clone()),
        5,
        Duration::from_secs(1),
    );

    let publisher = match args.bot_token {
        Some(token) => Some(TelegramPublisher::new(token)),
        None => {
            info!("BOT_TOKEN not set; digests will be generated but not published");
            None
        }
    };

    for flow in &config.flows {
        info!(flow = %flow.name, source = %flow.source_url, "Watching flow");
    }

    let scheduler = Scheduler::new(
        config.flows.clone(),
        pipeline,
        summarizer,
        publisher,
        TokioSleep,
        config.pacing.clone(),
    );

    scheduler.run().await;
    Ok(())
}
