//! Error types for the ingestion pipeline.
//!
//! Each variant corresponds to one failure class the scheduler isolates at
//! the per-flow boundary. Summarization and publishing collaborators report
//! their own opaque errors (`Box<dyn Error>`) and are handled separately:
//! they run strictly after the pipeline has committed, so their failures
//! never touch pipeline state.

use thiserror::Error;

/// Failure classes for a single flow's pipeline run.
#[derive(Error, Debug)]
pub enum DigestError {
    /// Network transport failure, timeout, or non-2xx response.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The feed listing is missing the expected structure.
    #[error("feed parse failed: {0}")]
    FeedParse(String),

    /// The article fetch returned a CAPTCHA or access-restriction page.
    #[error("access challenge page detected")]
    Blocked,

    /// No article container matched, or the container held no text.
    #[error("content extraction failed: {0}")]
    ContentExtraction(String),

    /// State or artifact write failure.
    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl From<reqwest::Error> for DigestError {
    fn from(e: reqwest::Error) -> Self {
        DigestError::Fetch(e.to_string())
    }
}

impl From<std::io::Error> for DigestError {
    fn from(e: std::io::Error) -> Self {
        DigestError::Persistence(e.to_string())
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, DigestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = DigestError::Fetch("connection refused".to_string());
        assert_eq!(err.to_string(), "fetch failed: connection refused");
    }

    #[test]
    fn test_blocked_error_display() {
        let err = DigestError::Blocked;
        assert_eq!(err.to_string(), "access challenge page detected");
    }

    #[test]
    fn test_io_error_converts_to_persistence() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: DigestError = io.into();
        assert!(matches!(err, DigestError::Persistence(_)));
        assert!(err.to_string().contains("read-only"));
    }
}
