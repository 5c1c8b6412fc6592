//! SessionProvider trait and DryRunSession (in-memory single session).

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::BackendError;

/// Owns the single remote viewing session.
///
/// Callers must close before opening: opening while a session is still held
/// is undefined in real automation backends.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open_session(&self, channel: &str) -> Result<(), BackendError>;

    /// Best-effort teardown of every open session.
    async fn close_all_sessions(&self) -> Result<(), BackendError>;

    /// Channel the session is actually showing right now.
    async fn current_observed_target(&self) -> Result<Option<String>, BackendError>;
}

/// In-memory session for dry runs: records which channel is "open".
///
/// Rejects an open while another session is held, so ordering bugs surface
/// instead of silently stacking sessions.
#[derive(Debug, Default)]
pub struct DryRunSession {
    open: Mutex<Option<String>>,
}

impl DryRunSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the session being closed from outside the scheduler.
    pub async fn drop_session(&self) {
        let mut open = self.open.lock().await;
        if let Some(channel) = open.take() {
            tracing::info!(channel = %channel, "dry-run session dropped externally");
        }
    }

    /// Simulate the session navigating away to another channel.
    pub async fn navigate(&self, channel: &str) {
        *self.open.lock().await = Some(channel.to_string());
    }
}

#[async_trait]
impl SessionProvider for DryRunSession {
    async fn open_session(&self, channel: &str) -> Result<(), BackendError> {
        let channel = channel.trim();
        if channel.is_empty() {
            return Err(BackendError::SessionOpen {
                channel: String::new(),
                detail: "empty channel".to_string(),
            });
        }

        let mut open = self.open.lock().await;
        if let Some(ref current) = *open {
            return Err(BackendError::SessionOpen {
                channel: channel.to_string(),
                detail: format!("session for {current} still open"),
            });
        }
        *open = Some(channel.to_string());
        tracing::info!(channel = %channel, "dry-run session opened");
        Ok(())
    }

    async fn close_all_sessions(&self) -> Result<(), BackendError> {
        if let Some(channel) = self.open.lock().await.take() {
            tracing::debug!(channel = %channel, "dry-run session closed");
        }
        Ok(())
    }

    async fn current_observed_target(&self) -> Result<Option<String>, BackendError> {
        Ok(self.open.lock().await.clone())
    }
}
