//! Tick scheduler: one base timer drives reconciliation, presence, and
//! stream selection on their own cadences.
//!
//! Runs as a tokio task. Each tick runs to completion before the next fire
//! is processed; fires missed during a slow tick are skipped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use dropwatch_core::{CadenceConfig, Selection, SelectionSource, TickCounter, TickPlan, WatchStatus};

use crate::selection::SelectionEngine;
use crate::switch::{Reconciliation, SwitchController, SwitchError, SwitchOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanKind {
    Full,
    Rescan,
}

/// Scheduler state mutated by ticks.
pub struct WatcherCore {
    engine: SelectionEngine,
    switch: SwitchController,
    cadence: CadenceConfig,
    counter: TickCounter,
    /// Set after a stop so the first tick after a restart scans immediately.
    scan_pending: bool,
    running: bool,
    source: Option<SelectionSource>,
    status: WatchStatus,
    status_tx: watch::Sender<WatchStatus>,
}

impl WatcherCore {
    pub fn new(engine: SelectionEngine, switch: SwitchController, cadence: CadenceConfig) -> Self {
        let (status_tx, _) = watch::channel(WatchStatus::default());
        Self {
            engine,
            switch,
            cadence,
            counter: TickCounter::new(),
            scan_pending: false,
            running: false,
            source: None,
            status: WatchStatus::default(),
            status_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WatchStatus> {
        self.status_tx.subscribe()
    }

    #[cfg(test)]
    pub fn engine(&self) -> &SelectionEngine {
        &self.engine
    }

    #[cfg(test)]
    pub fn switch(&self) -> &SwitchController {
        &self.switch
    }

    /// Process one base tick.
    pub async fn tick(&mut self) -> TickPlan {
        let tick = self.counter.advance();
        let plan = self.cadence.plan(tick);
        tracing::debug!(tick, "tick");

        // Drift is handled before any scan so presence never outlives the session.
        self.reconcile().await;

        let pending = std::mem::take(&mut self.scan_pending);
        if plan.initial_scan || (pending && !plan.rescan) {
            self.scan(ScanKind::Full).await;
        }

        if plan.presence {
            self.switch.presence().on_presence_tick().await;
        }
        if plan.secondary {
            self.switch.presence().on_secondary_tick().await;
        }

        if plan.rescan {
            tracing::info!(tick, "periodic rescan");
            self.scan(ScanKind::Rescan).await;
        }

        self.publish();
        plan
    }

    async fn reconcile(&mut self) {
        match self.switch.reconcile().await {
            Reconciliation::Drifted { expected, observed } => {
                tracing::warn!(
                    expected = %expected,
                    observed = observed.as_deref().unwrap_or("-"),
                    "session lost, waiting for next scan"
                );
                self.engine.release_farming();
                self.source = None;
            }
            Reconciliation::Detached | Reconciliation::InSync | Reconciliation::Unknown => {}
        }
    }

    async fn scan(&mut self, kind: ScanKind) {
        let selection = match kind {
            ScanKind::Full => self.engine.full_scan().await,
            ScanKind::Rescan => self.engine.rescan().await,
        };
        self.status.last_scan_at = Some(Utc::now());

        let Some(selection) = selection else {
            // The stream stays attached, but a campaign that is no longer
            // farmed must not be reported as its source.
            let stale = self
                .source
                .as_ref()
                .and_then(SelectionSource::slug)
                .is_some_and(|slug| self.engine.farming_slug() != Some(slug));
            if stale {
                self.source = None;
            }
            return;
        };
        if let Err(e) = self.apply(&selection).await {
            tracing::warn!("scan failed: {e}");
            self.engine.release_farming();
            self.source = None;
        }
    }

    async fn apply(&mut self, selection: &Selection) -> Result<(), SwitchError> {
        match self.switch.switch_to(&selection.channel).await? {
            SwitchOutcome::Switched { previous } => {
                tracing::info!(
                    channel = %selection.channel,
                    source = %selection.source,
                    previous = previous.as_deref().unwrap_or("-"),
                    "stream switched"
                );
                self.status.last_switch_at = Some(Utc::now());
            }
            SwitchOutcome::Unchanged => {
                tracing::debug!(channel = %selection.channel, "stream unchanged");
            }
        }
        self.source = Some(selection.source.clone());
        Ok(())
    }

    /// Tear down the session and presence; the next tick rescans.
    pub async fn release(&mut self) {
        self.switch.release().await;
        self.engine.release_farming();
        self.source = None;
        self.scan_pending = self.counter.current().is_some();
        self.publish();
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
        self.publish();
    }

    fn publish(&mut self) {
        let farming_slug = self.engine.farming_slug().map(str::to_string);
        self.status.running = self.running;
        self.status.current_stream = self.switch.current_stream().map(str::to_string);
        self.status.source = self
            .status
            .current_stream
            .as_ref()
            .and(self.source.clone());
        self.status.farming_campaign = farming_slug
            .as_deref()
            .and_then(|slug| self.engine.campaign(slug))
            .map(|c| c.name.clone());
        self.status.farming_slug = farming_slug;
        self.status.tick = self.counter.current();
        self.status_tx.send_replace(self.status.clone());
    }
}

/// Lifecycle handle around [`WatcherCore`]: owns the base timer task.
pub struct Watcher {
    core: Arc<Mutex<WatcherCore>>,
    period: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
    status_rx: watch::Receiver<WatchStatus>,
}

impl Watcher {
    pub fn new(core: WatcherCore, period: Duration) -> Self {
        let status_rx = core.subscribe();
        Self {
            core: Arc::new(Mutex::new(core)),
            period,
            timer: Mutex::new(None),
            status_rx,
        }
    }

    /// Start firing every base period, the first fire immediately.
    /// Calling again replaces the running timer.
    pub async fn start(&self) {
        let mut timer = self.timer.lock().await;
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        self.core.lock().await.set_running(true);
        let core = Arc::clone(&self.core);
        let period = self.period;
        *timer = Some(tokio::spawn(run_timer(core, period)));
        let period_ms = u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX);
        tracing::info!(period_ms, "watcher started");
    }

    /// Cancel the timer, then release the session and presence.
    /// An in-flight tick finishes before the release runs.
    pub async fn stop(&self) {
        let handle = self.timer.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }
        let mut core = self.core.lock().await;
        core.release().await;
        core.set_running(false);
        tracing::info!("watcher stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.timer
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Latest published status. Never blocks on a tick.
    pub fn status(&self) -> WatchStatus {
        self.status_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WatchStatus> {
        self.status_rx.clone()
    }
}

async fn run_timer(core: Arc<Mutex<WatcherCore>>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        // A separate task per tick so a panicking collaborator is contained
        // and the timer keeps firing.
        let core = Arc::clone(&core);
        let tick = tokio::spawn(async move { core.lock().await.tick().await });
        if let Err(e) = tick.await {
            tracing::error!("watcher tick failed: {e}");
        }
    }
}
