//! Command-line interface definitions.
//!
//! Paths come from flags; credentials come from flags or environment
//! variables. The flow list itself lives in the YAML config file.

use clap::Parser;

/// Command-line arguments for the flow digest watcher.
///
/// # Examples
///
/// ```sh
/// # Minimal: flows in config.yaml, API key from the environment
/// LITELLM_API_KEY=sk-... flow_digest
///
/// # Explicit paths and a Telegram bot token
/// flow_digest -c flows.yaml --state-dir /var/lib/digest/state \
///     --bot-token $BOT_TOKEN
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML config file listing flows and pacing
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Directory for per-flow dedup state files
    #[arg(long, default_value = "state")]
    pub state_dir: String,

    /// Directory for per-flow artifact and generated-post files
    #[arg(long, default_value = "artifacts")]
    pub artifact_dir: String,

    /// Directory for raw-page dumps written on block/extraction failures
    #[arg(long, default_value = "debug")]
    pub debug_dir: String,

    /// Chat-completions endpoint of the summarization API
    #[arg(
        long,
        env = "LITELLM_API_URL",
        default_value = "https://litellm.tokengate.ru/v1/chat/completions"
    )]
    pub api_url: String,

    /// API key for the summarization API
    #[arg(long, env = "LITELLM_API_KEY")]
    pub api_key: String,

    /// Model identifier passed to the summarization API
    #[arg(long, env = "LLM_MODEL", default_value = "openai/gpt-oss-20b")]
    pub model: String,

    /// Telegram bot token; when absent, digests are generated but not posted
    #[arg(long, env = "BOT_TOKEN")]
    pub bot_token: Option<String>,
}
