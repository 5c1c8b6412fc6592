//! Presence simulation: the gated simulator the scheduler drives and the
//! low-level actions it wraps.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::BackendError;

/// Idle-avoidance behavior attached to the current session.
///
/// The tick hooks must be no-ops unless [`PresenceSimulator::start`] was
/// called and [`PresenceSimulator::stop`] has not been called since.
#[async_trait]
pub trait PresenceSimulator: Send + Sync {
    fn start(&self);
    fn stop(&self);
    fn is_active(&self) -> bool;

    /// Light action on the presence cadence (cursor jitter).
    async fn on_presence_tick(&self);

    /// Heavier action on the secondary cadence (bonus claim).
    async fn on_secondary_tick(&self);
}

/// Raw actions against the attached session. Not gated.
#[async_trait]
pub trait PresenceActions: Send + Sync {
    async fn jitter_cursor(&self) -> Result<(), BackendError>;

    /// Try to claim a pending bonus. `Ok(true)` when something was claimed.
    async fn claim_bonus(&self) -> Result<bool, BackendError>;
}

/// Boolean-gated [`PresenceSimulator`] over a set of [`PresenceActions`].
///
/// Action failures are logged and dropped; a missing cursor or claim button
/// is routine.
#[derive(Debug, Default)]
pub struct GatedPresence<A> {
    actions: A,
    active: AtomicBool,
}

impl<A: PresenceActions> GatedPresence<A> {
    pub fn new(actions: A) -> Self {
        Self {
            actions,
            active: AtomicBool::new(false),
        }
    }

    pub fn actions(&self) -> &A {
        &self.actions
    }
}

#[async_trait]
impl<A: PresenceActions> PresenceSimulator for GatedPresence<A> {
    fn start(&self) {
        if !self.active.swap(true, Ordering::SeqCst) {
            tracing::debug!("presence started");
        }
    }

    fn stop(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            tracing::debug!("presence stopped");
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn on_presence_tick(&self) {
        if !self.is_active() {
            return;
        }
        if let Err(e) = self.actions.jitter_cursor().await {
            tracing::debug!("cursor jitter failed: {e}");
        }
    }

    async fn on_secondary_tick(&self) {
        if !self.is_active() {
            return;
        }
        match self.actions.claim_bonus().await {
            Ok(true) => tracing::info!("bonus claimed"),
            Ok(false) => {}
            Err(e) => tracing::warn!("bonus claim failed: {e}"),
        }
    }
}

/// Dry-run actions: log and count, never claim anything.
#[derive(Debug, Default)]
pub struct LoggingPresenceActions {
    jitters: AtomicU64,
    claim_attempts: AtomicU64,
}

impl LoggingPresenceActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jitters(&self) -> u64 {
        self.jitters.load(Ordering::Relaxed)
    }

    pub fn claim_attempts(&self) -> u64 {
        self.claim_attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PresenceActions for LoggingPresenceActions {
    async fn jitter_cursor(&self) -> Result<(), BackendError> {
        let n = self.jitters.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(count = n, "dry-run cursor jitter");
        Ok(())
    }

    async fn claim_bonus(&self) -> Result<bool, BackendError> {
        let n = self.claim_attempts.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(count = n, "dry-run bonus claim check");
        Ok(false)
    }
}
