//! Data models for feed items, extracted articles, and per-flow state.
//!
//! Three lifetimes of data meet here:
//! - [`ItemMeta`] is produced fresh on every feed check and never persisted;
//!   only its `id` survives, inside [`FlowState`].
//! - [`Article`] is produced once per novel item and rendered to the per-flow
//!   artifact file.
//! - [`FlowState`] is the durable dedup record, one JSON file per flow.

use serde::{Deserialize, Serialize};

/// Identity of the newest item on a feed listing page.
///
/// `id` is the raw link href — a stable path compared only for equality,
/// never parsed or interpreted. `url` is the same href resolved to an
/// absolute, fetchable address.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemMeta {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// A fully materialized article: metadata plus the extracted plain-text body.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Name of the flow this article came from.
    pub flow: String,
    pub id: String,
    pub title: String,
    pub url: String,
    /// Extracted body, block texts joined with blank lines, no markup.
    pub text: String,
}

/// Durable dedup state for one flow.
///
/// `last_seen_id` advances only when a pipeline run completes all the way
/// through the state save; a failed run leaves it untouched so the same item
/// is retried on the next cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowState {
    pub last_seen_id: Option<String>,
}

/// Outcome of one pipeline run for one flow.
///
/// "Nothing new" is an expected, frequent result — it is data, not an error.
/// Failures travel on the `Err` side of [`crate::error::Result`].
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// The newest feed item matches the persisted `last_seen_id`.
    NoUpdate,
    /// A novel item was materialized and dedup state advanced.
    Updated(Article),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_state_default_is_empty() {
        let state = FlowState::default();
        assert_eq!(state.last_seen_id, None);
    }

    #[test]
    fn test_flow_state_roundtrip() {
        let state = FlowState {
            last_seen_id: Some("/articles/42".to_string()),
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: FlowState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_flow_state_missing_field_deserializes_empty() {
        let state: FlowState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.last_seen_id, None);
    }

    #[test]
    fn test_check_outcome_equality() {
        assert_eq!(CheckOutcome::NoUpdate, CheckOutcome::NoUpdate);
        let article = Article {
            flow: "ai".to_string(),
            id: "/articles/1".to_string(),
            title: "Title".to_string(),
            url: "https://site/articles/1".to_string(),
            text: "Body".to_string(),
        };
        assert_ne!(CheckOutcome::NoUpdate, CheckOutcome::Updated(article));
    }
}
