//! Flow and pacing configuration.
//!
//! The watcher is configured from a single YAML file supplied at startup and
//! never reloaded. A minimal config lists the flows; everything else has
//! defaults:
//!
//! ```yaml
//! flows:
//!   - name: ai_ml
//!     source_url: https://habr.com/ru/flows/ai_and_ml/articles/rated10/
//!     channel_key: "-1002942125256"
//! pacing:
//!   cycle_secs: 3600
//!   cycle_jitter_secs: 300
//!   flow_delay_min_secs: 2
//!   flow_delay_max_secs: 15
//! block_markers:
//!   - captcha
//!   - cloudflare
//! fetch_timeout_secs: 20
//! ```
//!
//! Validation happens once at startup; a bad config is the one error class
//! that terminates the process.

use serde::Deserialize;
use std::error::Error;
use std::path::Path;
use url::Url;

/// One independently tracked content source.
///
/// `name` keys the flow's state, artifact, post, and debug files, so it is
/// restricted to filename-safe characters. `channel_key` identifies the
/// publish destination and is opaque to the pipeline — the publisher resolves
/// it.
#[derive(Debug, Clone, Deserialize)]
pub struct Flow {
    pub name: String,
    pub source_url: String,
    pub channel_key: String,
}

/// Sleep bounds for the scheduling loop.
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Base sleep between full cycles.
    #[serde(default = "default_cycle_secs")]
    pub cycle_secs: u64,
    /// The cycle sleep is drawn uniformly from `cycle_secs ± cycle_jitter_secs`.
    #[serde(default = "default_cycle_jitter_secs")]
    pub cycle_jitter_secs: u64,
    /// Lower bound of the random pre-flow delay.
    #[serde(default = "default_flow_delay_min_secs")]
    pub flow_delay_min_secs: u64,
    /// Upper bound of the random pre-flow delay.
    #[serde(default = "default_flow_delay_max_secs")]
    pub flow_delay_max_secs: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            cycle_secs: default_cycle_secs(),
            cycle_jitter_secs: default_cycle_jitter_secs(),
            flow_delay_min_secs: default_flow_delay_min_secs(),
            flow_delay_max_secs: default_flow_delay_max_secs(),
        }
    }
}

fn default_cycle_secs() -> u64 {
    3600
}

fn default_cycle_jitter_secs() -> u64 {
    300
}

fn default_flow_delay_min_secs() -> u64 {
    2
}

fn default_flow_delay_max_secs() -> u64 {
    15
}

fn default_fetch_timeout_secs() -> u64 {
    20
}

/// Marker phrases of known challenge/anti-bot pages.
///
/// Matched against lowercased page text, so entries should be lowercase.
/// The list is a config field because it is inherently site-specific and
/// brittle; operators extend it without a rebuild.
pub(crate) fn default_block_markers() -> Vec<String> {
    [
        "доступ ограничен",
        "captcha",
        "капча",
        "подтвердите",
        "robot",
        "cloudflare",
    ]
    .iter()
    .map(|m| m.to_string())
    .collect()
}

/// Top-level watcher configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub flows: Vec<Flow>,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default = "default_block_markers")]
    pub block_markers: Vec<String>,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
        Self::parse(&raw)
    }

    /// Parse and validate config text.
    pub fn parse(raw: &str) -> Result<Self, Box<dyn Error>> {
        let config: Config = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.flows.is_empty() {
            return Err("config defines no flows".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for flow in &self.flows {
            if flow.name.is_empty()
                || !flow
                    .name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(format!(
                    "flow name {:?} must be nonempty [A-Za-z0-9_-] (it keys state and artifact files)",
                    flow.name
                ));
            }
            if !seen.insert(flow.name.as_str()) {
                return Err(format!("duplicate flow name {:?}", flow.name));
            }
            Url::parse(&flow.source_url)
                .map_err(|e| format!("flow {:?} has invalid source_url: {e}", flow.name))?;
            if flow.channel_key.is_empty() {
                return Err(format!("flow {:?} has an empty channel_key", flow.name));
            }
        }
        if self.pacing.flow_delay_min_secs > self.pacing.flow_delay_max_secs {
            return Err("pacing.flow_delay_min_secs exceeds flow_delay_max_secs".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
flows:
  - name: ai_ml
    source_url: https://habr.com/ru/flows/ai_and_ml/articles/rated10/
    channel_key: "-100123"
"#;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.flows.len(), 1);
        assert_eq!(config.flows[0].name, "ai_ml");
        assert_eq!(config.pacing.cycle_secs, 3600);
        assert_eq!(config.pacing.cycle_jitter_secs, 300);
        assert_eq!(config.fetch_timeout_secs, 20);
        assert!(config.block_markers.iter().any(|m| m == "captcha"));
        assert!(config.block_markers.iter().any(|m| m == "доступ ограничен"));
    }

    #[test]
    fn test_explicit_pacing_overrides_defaults() {
        let raw = format!(
            "{MINIMAL}pacing:\n  cycle_secs: 60\n  cycle_jitter_secs: 5\n  flow_delay_min_secs: 0\n  flow_delay_max_secs: 1\n"
        );
        let config = Config::parse(&raw).unwrap();
        assert_eq!(config.pacing.cycle_secs, 60);
        assert_eq!(config.pacing.flow_delay_max_secs, 1);
    }

    #[test]
    fn test_empty_flows_rejected() {
        let err = Config::parse("flows: []\n").unwrap_err();
        assert!(err.to_string().contains("no flows"));
    }

    #[test]
    fn test_duplicate_flow_names_rejected() {
        let raw = r#"
flows:
  - name: ai
    source_url: https://habr.com/a
    channel_key: "1"
  - name: ai
    source_url: https://habr.com/b
    channel_key: "2"
"#;
        let err = Config::parse(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_unsafe_flow_name_rejected() {
        let raw = r#"
flows:
  - name: "a/b"
    source_url: https://habr.com/a
    channel_key: "1"
"#;
        assert!(Config::parse(raw).is_err());
    }

    #[test]
    fn test_invalid_source_url_rejected() {
        let raw = r#"
flows:
  - name: ai
    source_url: "not a url"
    channel_key: "1"
"#;
        let err = Config::parse(raw).unwrap_err();
        assert!(err.to_string().contains("source_url"));
    }

    #[test]
    fn test_inverted_delay_bounds_rejected() {
        let raw = format!("{MINIMAL}pacing:\n  flow_delay_min_secs: 30\n  flow_delay_max_secs: 5\n");
        assert!(Config::parse(&raw).is_err());
    }
}
