//! Session switch controller.
//!
//! Sole owner of the cached `current_stream` belief. Every switch tears the
//! previous session down before opening the next one, so at most one session
//! is ever held.

use std::sync::Arc;

use dropwatch_backend::{BackendError, PresenceSimulator, SessionProvider};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("failed to open {channel}: {source}")]
    Open {
        channel: String,
        #[source]
        source: BackendError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Target already attached; nothing touched.
    Unchanged,
    Switched { previous: Option<String> },
}

/// Result of comparing the cached belief with the session's ground truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing cached, nothing to check.
    Detached,
    InSync,
    /// Session lost or navigated away; cache cleared and presence stopped.
    Drifted {
        expected: String,
        observed: Option<String>,
    },
    /// Ground truth unavailable this tick; cache left alone.
    Unknown,
}

pub struct SwitchController {
    session: Arc<dyn SessionProvider>,
    presence: Arc<dyn PresenceSimulator>,
    current_stream: Option<String>,
}

impl SwitchController {
    pub fn new(session: Arc<dyn SessionProvider>, presence: Arc<dyn PresenceSimulator>) -> Self {
        Self {
            session,
            presence,
            current_stream: None,
        }
    }

    pub fn current_stream(&self) -> Option<&str> {
        self.current_stream.as_deref()
    }

    pub fn presence(&self) -> &dyn PresenceSimulator {
        self.presence.as_ref()
    }

    /// Attach the session to `target`. No-op when already attached.
    pub async fn switch_to(&mut self, target: &str) -> Result<SwitchOutcome, SwitchError> {
        if self
            .current_stream
            .as_deref()
            .is_some_and(|current| same_channel(current, target))
        {
            return Ok(SwitchOutcome::Unchanged);
        }

        let previous = self.current_stream.take();
        tracing::info!(
            from = previous.as_deref().unwrap_or("-"),
            to = %target,
            "switching stream"
        );

        self.presence.stop();
        if let Err(e) = self.session.close_all_sessions().await {
            tracing::debug!("teardown before switch failed (ignored): {e}");
        }

        self.session
            .open_session(target)
            .await
            .map_err(|source| SwitchError::Open {
                channel: target.to_string(),
                source,
            })?;

        self.current_stream = Some(target.to_string());
        self.presence.start();
        Ok(SwitchOutcome::Switched { previous })
    }

    /// Compare the cached belief against the session's observed target.
    pub async fn reconcile(&mut self) -> Reconciliation {
        let Some(expected) = self.current_stream.clone() else {
            return Reconciliation::Detached;
        };

        let observed = match self.session.current_observed_target().await {
            Ok(observed) => observed,
            Err(e) => {
                tracing::debug!("observed target unavailable: {e}");
                return Reconciliation::Unknown;
            }
        };

        if observed
            .as_deref()
            .is_some_and(|o| same_channel(o, &expected))
        {
            return Reconciliation::InSync;
        }

        self.presence.stop();
        self.current_stream = None;
        Reconciliation::Drifted { expected, observed }
    }

    /// Stop presence and close the session. Safe to call repeatedly.
    pub async fn release(&mut self) {
        self.presence.stop();
        if let Err(e) = self.session.close_all_sessions().await {
            tracing::debug!("session teardown failed (ignored): {e}");
        }
        self.current_stream = None;
    }
}

/// Channel identifiers compare case-insensitively.
fn same_channel(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
