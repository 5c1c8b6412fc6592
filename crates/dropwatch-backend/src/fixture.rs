//! File-backed campaign oracle for dry runs.
//!
//! The fixture is re-read on every query so edits take effect on the next
//! scan without restarting the daemon:
//!
//! ```json
//! {
//!   "active":   ["Rust", "PUBG: Battlegrounds"],
//!   "claimed":  ["pubg-battlegrounds"],
//!   "channels": { "rust": ["channelX", "channelY"] },
//!   "live":     ["sist1m"]
//! }
//! ```
//!
//! Campaign names in `active` and `claimed` are normalized to slugs.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use dropwatch_core::slugify;
use serde::Deserialize;

use crate::error::BackendError;
use crate::oracle::CampaignOracle;

/// Parsed fixture contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FixtureSnapshot {
    pub active: Vec<String>,
    pub claimed: Vec<String>,
    /// slug -> candidate channels, first wins.
    pub channels: HashMap<String, Vec<String>>,
    pub live: Vec<String>,
}

impl FixtureSnapshot {
    pub fn parse(text: &str) -> Result<Self, BackendError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Active slugs, normalized and de-duplicated in first-seen order.
    pub fn active_slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = Vec::with_capacity(self.active.len());
        for slug in self.active.iter().map(|name| slugify(name)) {
            if !slug.is_empty() && !slugs.contains(&slug) {
                slugs.push(slug);
            }
        }
        slugs
    }

    pub fn is_claimed(&self, slug: &str) -> bool {
        self.claimed.iter().any(|name| slugify(name) == slug)
    }

    pub fn channel_for(&self, slug: &str) -> Option<String> {
        self.channels
            .get(slug)?
            .iter()
            .map(|c| c.trim())
            .find(|c| !c.is_empty())
            .map(str::to_string)
    }

    pub fn is_live(&self, channel: &str) -> bool {
        self.live.iter().any(|c| c.eq_ignore_ascii_case(channel))
    }
}

#[derive(Debug, Clone)]
pub struct FixtureOracle {
    path: PathBuf,
}

impl FixtureOracle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<FixtureSnapshot, BackendError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        FixtureSnapshot::parse(&text)
    }
}

#[async_trait]
impl CampaignOracle for FixtureOracle {
    async fn list_active_campaign_slugs(&self) -> Result<Vec<String>, BackendError> {
        let slugs = self.load().await?.active_slugs();
        tracing::debug!(?slugs, "fixture active campaigns");
        Ok(slugs)
    }

    async fn is_reward_claimed(&self, slug: &str) -> Result<bool, BackendError> {
        Ok(self.load().await?.is_claimed(slug))
    }

    async fn resolve_channel_for_slug(&self, slug: &str) -> Result<Option<String>, BackendError> {
        Ok(self.load().await?.channel_for(slug))
    }

    async fn is_channel_live(&self, channel: &str) -> Result<bool, BackendError> {
        Ok(self.load().await?.is_live(channel))
    }
}
