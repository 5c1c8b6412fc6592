//! Error types for the collaborator boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("failed to open session for {channel}: {detail}")]
    SessionOpen { channel: String, detail: String },

    #[error("fixture parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("backend io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    pub fn timeout(operation: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
