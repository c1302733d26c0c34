//! Small helpers: log-safe truncation and output-directory validation.

use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes, backing off to the nearest
/// character boundary (summaries here are mostly Cyrillic, so byte indexing
/// alone would panic mid-character), with an ellipsis and byte-count
/// indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if missing, then probes it with a throwaway file.
/// Run once per output directory at startup so permission problems surface
/// before the first cycle instead of mid-pipeline.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string_unchanged() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // Cyrillic characters are 2 bytes each; byte 5 falls mid-character.
        let s = "привет мир";
        let result = truncate_for_log(s, 5);
        assert!(result.starts_with("пр"));
        assert!(!result.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_and_probes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out");
        ensure_writable_dir(path.to_str().unwrap()).await.unwrap();
        assert!(path.is_dir());
        assert!(std::fs::read_dir(&path).unwrap().next().is_none());
    }
}
