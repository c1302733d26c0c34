//! Per-flow dedup state persistence.
//!
//! One small JSON file per flow under the state directory. The contract is
//! deliberately asymmetric:
//!
//! - [`StateStore::load`] never fails. A missing, unreadable, empty, or
//!   malformed file degrades to the empty state — the next item is treated
//!   as new and re-announced, which is the cheap direction to fail in.
//! - [`StateStore::save`] propagates every failure. Failing to persist state
//!   risks duplicate processing on the next cycle, and the caller decides how
//!   loudly to report that.
//!
//! Saves go through a temp file and rename so a concurrent load in the same
//! process can never observe a half-written file.

use crate::error::Result;
use crate::models::FlowState;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Loads and saves [`FlowState`] records keyed by flow name.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the state file for a flow.
    pub fn path(&self, flow_name: &str) -> PathBuf {
        self.dir.join(format!("{flow_name}.json"))
    }

    /// Load a flow's state. Absent or malformed data yields the empty state.
    pub fn load(&self, flow_name: &str) -> FlowState {
        let path = self.path(flow_name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return FlowState::default(),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FlowState::default();
        }
        match serde_json::from_str(trimmed) {
            Ok(state) => {
                debug!(flow = flow_name, ?state, "loaded flow state");
                state
            }
            Err(e) => {
                warn!(
                    flow = flow_name,
                    path = %path.display(),
                    error = %e,
                    "state file is malformed; treating as empty"
                );
                FlowState::default()
            }
        }
    }

    /// Persist a flow's state atomically (write temp file, then rename).
    pub fn save(&self, flow_name: &str, state: &FlowState) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(flow_name);
        let tmp = tmp_path(&path);
        let json = serde_json::to_string(state)
            .map_err(|e| crate::error::DigestError::Persistence(e.to_string()))?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(flow = flow_name, path = %path.display(), "saved flow state");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_yields_empty_state() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        assert_eq!(store.load("ai"), FlowState::default());
    }

    #[test]
    fn test_load_empty_file_yields_empty_state() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(store.path("ai"), "  \n").unwrap();
        assert_eq!(store.load("ai"), FlowState::default());
    }

    #[test]
    fn test_load_corrupt_file_yields_empty_state() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        fs::write(store.path("ai"), "{not json").unwrap();
        assert_eq!(store.load("ai"), FlowState::default());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let state = FlowState {
            last_seen_id: Some("/articles/42".to_string()),
        };
        store.save("ai", &state).unwrap();
        assert_eq!(store.load("ai"), state);
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store
            .save(
                "ai",
                &FlowState {
                    last_seen_id: Some("/articles/1".to_string()),
                },
            )
            .unwrap();
        store
            .save(
                "ai",
                &FlowState {
                    last_seen_id: Some("/articles/2".to_string()),
                },
            )
            .unwrap();
        assert_eq!(
            store.load("ai").last_seen_id.as_deref(),
            Some("/articles/2")
        );
        assert!(!tmp_path(&store.path("ai")).exists());
    }

    #[test]
    fn test_save_creates_state_dir() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested/state"));
        store.save("ai", &FlowState::default()).unwrap();
        assert!(store.path("ai").exists());
    }

    #[test]
    fn test_save_failure_propagates() {
        let dir = tempdir().unwrap();
        // Point the store's directory at a regular file so create_dir_all fails.
        let blocker = dir.path().join("occupied");
        fs::write(&blocker, "x").unwrap();
        let store = StateStore::new(&blocker);
        let err = store.save("ai", &FlowState::default()).unwrap_err();
        assert!(matches!(err, crate::error::DigestError::Persistence(_)));
    }

    #[test]
    fn test_flows_have_disjoint_state_files() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store
            .save(
                "a",
                &FlowState {
                    last_seen_id: Some("/1".to_string()),
                },
            )
            .unwrap();
        store
            .save(
                "b",
                &FlowState {
                    last_seen_id: Some("/2".to_string()),
                },
            )
            .unwrap();
        assert_eq!(store.load("a").last_seen_id.as_deref(), Some("/1"));
        assert_eq!(store.load("b").last_seen_id.as_deref(), Some("/2"));
    }
}
