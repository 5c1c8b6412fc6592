//! Hand-written collaborator fakes shared by the runtime tests.
//!
//! Every fake can append to a shared call log so tests can assert on the
//! interleaving of session and presence calls.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dropwatch_backend::{BackendError, CampaignOracle, PresenceSimulator, SessionProvider};

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &CallLog) -> Vec<String> {
    log.lock().expect("call log").clone()
}

fn record(log: &CallLog, entry: String) {
    log.lock().expect("call log").push(entry);
}

// ─── Oracle ───────────────────────────────────────────────────────

#[derive(Default)]
struct OracleState {
    active: Vec<String>,
    claimed: HashSet<String>,
    channels: HashMap<String, String>,
    live: HashSet<String>,
    /// Query keys (`list`, `claimed:<slug>`, `resolve:<slug>`, `live:<ch>`) that fail.
    failing: HashSet<String>,
    /// Query keys that never complete.
    hanging: HashSet<String>,
}

pub struct FakeOracle {
    state: Mutex<OracleState>,
    log: CallLog,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(OracleState::default()),
            log: new_log(),
        }
    }

    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = Arc::clone(log);
        self
    }

    fn state_mut(&mut self) -> &mut OracleState {
        self.state.get_mut().expect("oracle state")
    }

    pub fn with_active(mut self, slugs: &[&str]) -> Self {
        self.state_mut().active = slugs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_claimed(mut self, slug: &str) -> Self {
        self.state_mut().claimed.insert(slug.to_string());
        self
    }

    pub fn with_channel(mut self, slug: &str, channel: &str) -> Self {
        self.state_mut()
            .channels
            .insert(slug.to_string(), channel.to_string());
        self
    }

    pub fn with_live(mut self, channel: &str) -> Self {
        self.state_mut().live.insert(channel.to_string());
        self
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.state_mut().failing.insert(key.to_string());
        self
    }

    pub fn hanging(mut self, key: &str) -> Self {
        self.state_mut().hanging.insert(key.to_string());
        self
    }

    /// Change what a slug resolves to after construction.
    pub fn set_channel(&self, slug: &str, channel: Option<&str>) {
        let mut state = self.state.lock().expect("oracle state");
        match channel {
            Some(ch) => state.channels.insert(slug.to_string(), ch.to_string()),
            None => state.channels.remove(slug),
        };
    }

    pub fn set_claimed(&self, slug: &str) {
        let mut state = self.state.lock().expect("oracle state");
        state.claimed.insert(slug.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        entries(&self.log)
    }

    async fn gate(&self, key: String) -> Result<(), BackendError> {
        record(&self.log, key.clone());
        let (fails, hangs) = {
            let state = self.state.lock().expect("oracle state");
            (state.failing.contains(&key), state.hanging.contains(&key))
        };
        if hangs {
            std::future::pending::<()>().await;
        }
        if fails {
            return Err(BackendError::Unavailable(format!("{key} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl CampaignOracle for FakeOracle {
    async fn list_active_campaign_slugs(&self) -> Result<Vec<String>, BackendError> {
        self.gate("list".to_string()).await?;
        Ok(self.state.lock().expect("oracle state").active.clone())
    }

    async fn is_reward_claimed(&self, slug: &str) -> Result<bool, BackendError> {
        self.gate(format!("claimed:{slug}")).await?;
        Ok(self.state.lock().expect("oracle state").claimed.contains(slug))
    }

    async fn resolve_channel_for_slug(&self, slug: &str) -> Result<Option<String>, BackendError> {
        self.gate(format!("resolve:{slug}")).await?;
        Ok(self
            .state
            .lock()
            .expect("oracle state")
            .channels
            .get(slug)
            .cloned())
    }

    async fn is_channel_live(&self, channel: &str) -> Result<bool, BackendError> {
        self.gate(format!("live:{channel}")).await?;
        Ok(self.state.lock().expect("oracle state").live.contains(channel))
    }
}

// ─── Session ──────────────────────────────────────────────────────

pub struct FakeSession {
    observed: Mutex<Option<String>>,
    fail_open: Mutex<HashSet<String>>,
    fail_close: AtomicBool,
    fail_observe: AtomicBool,
    log: CallLog,
}

impl FakeSession {
    pub fn new(log: &CallLog) -> Self {
        Self {
            observed: Mutex::new(None),
            fail_open: Mutex::new(HashSet::new()),
            fail_close: AtomicBool::new(false),
            fail_observe: AtomicBool::new(false),
            log: Arc::clone(log),
        }
    }

    pub fn fail_open_for(&self, channel: &str) {
        self.fail_open
            .lock()
            .expect("fail_open")
            .insert(channel.to_string());
    }

    pub fn fail_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }

    pub fn fail_observe(&self, fail: bool) {
        self.fail_observe.store(fail, Ordering::SeqCst);
    }

    /// Simulate the session being closed or navigated elsewhere externally.
    pub fn set_observed(&self, channel: Option<&str>) {
        *self.observed.lock().expect("observed") = channel.map(str::to_string);
    }

    pub fn observed(&self) -> Option<String> {
        self.observed.lock().expect("observed").clone()
    }
}

#[async_trait]
impl SessionProvider for FakeSession {
    async fn open_session(&self, channel: &str) -> Result<(), BackendError> {
        record(&self.log, format!("open:{channel}"));
        if self.fail_open.lock().expect("fail_open").contains(channel) {
            return Err(BackendError::SessionOpen {
                channel: channel.to_string(),
                detail: "navigation failed".to_string(),
            });
        }
        *self.observed.lock().expect("observed") = Some(channel.to_string());
        Ok(())
    }

    async fn close_all_sessions(&self) -> Result<(), BackendError> {
        record(&self.log, "close".to_string());
        *self.observed.lock().expect("observed") = None;
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("page already gone".to_string()));
        }
        Ok(())
    }

    async fn current_observed_target(&self) -> Result<Option<String>, BackendError> {
        if self.fail_observe.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("browser busy".to_string()));
        }
        Ok(self.observed())
    }
}

// ─── Presence ─────────────────────────────────────────────────────

pub struct FakePresence {
    active: AtomicBool,
    presence_ticks: AtomicU64,
    secondary_ticks: AtomicU64,
    log: CallLog,
}

impl FakePresence {
    pub fn new(log: &CallLog) -> Self {
        Self {
            active: AtomicBool::new(false),
            presence_ticks: AtomicU64::new(0),
            secondary_ticks: AtomicU64::new(0),
            log: Arc::clone(log),
        }
    }

    /// Gated presence actions actually performed.
    pub fn presence_ticks(&self) -> u64 {
        self.presence_ticks.load(Ordering::SeqCst)
    }

    pub fn secondary_ticks(&self) -> u64 {
        self.secondary_ticks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PresenceSimulator for FakePresence {
    fn start(&self) {
        record(&self.log, "presence:start".to_string());
        self.active.store(true, Ordering::SeqCst);
    }

    fn stop(&self) {
        record(&self.log, "presence:stop".to_string());
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn on_presence_tick(&self) {
        if self.is_active() {
            self.presence_ticks.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn on_secondary_tick(&self) {
        if self.is_active() {
            self.secondary_ticks.fetch_add(1, Ordering::SeqCst);
        }
    }
}
