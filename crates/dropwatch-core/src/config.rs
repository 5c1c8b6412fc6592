//! Watcher configuration model: TOML schema, defaults and validation.
//!
//! Reading the file is the runtime's job; this module only parses text.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cadence::{CadenceConfig, DEFAULT_TICK_PERIOD_MS};
use crate::slug::slugify;
use crate::types::Campaign;

/// Default upper bound for a single oracle query (milliseconds).
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("tick_period_ms must be greater than zero")]
    ZeroTickPeriod,

    #[error("query_timeout_ms must be greater than zero")]
    ZeroQueryTimeout,

    #[error("cadence.{name} must be greater than zero")]
    ZeroMultiplier { name: &'static str },

    #[error("cadence.secondary ({secondary}) must be a multiple of cadence.presence ({presence})")]
    MisalignedCadence { presence: u64, secondary: u64 },

    #[error("campaign #{index} has an empty name")]
    EmptyCampaignName { index: usize },

    #[error("campaign {name:?} has an empty slug")]
    EmptySlug { name: String },

    #[error("duplicate campaign slug: {0}")]
    DuplicateSlug(String),

    #[error("fallback channel #{index} is empty")]
    EmptyFallback { index: usize },

    #[error("no campaigns and no fallback channels configured")]
    NothingToWatch,
}

/// A campaign as written in the config file. The slug is derived from the
/// name when omitted; an explicit slug is normalized the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CampaignEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl CampaignEntry {
    fn resolved_slug(&self) -> String {
        match self.slug.as_deref() {
            Some(slug) => slugify(slug),
            None => slugify(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatcherConfig {
    /// Base timer period in milliseconds.
    pub tick_period_ms: u64,
    /// Upper bound for a single oracle query in milliseconds.
    pub query_timeout_ms: u64,
    pub cadence: CadenceConfig,
    /// Priority-ordered, index 0 first.
    pub campaigns: Vec<CampaignEntry>,
    /// Tried in order once every campaign is exhausted.
    pub fallback_channels: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            cadence: CadenceConfig::default(),
            campaigns: Vec::new(),
            fallback_channels: Vec::new(),
        }
    }
}

impl WatcherConfig {
    /// Parse TOML text. Does not validate; call [`WatcherConfig::validate`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if self.query_timeout_ms == 0 {
            return Err(ConfigError::ZeroQueryTimeout);
        }

        let cadence = &self.cadence;
        for (name, every) in [
            ("presence", cadence.presence),
            ("secondary", cadence.secondary),
            ("rescan", cadence.rescan),
        ] {
            if every == 0 {
                return Err(ConfigError::ZeroMultiplier { name });
            }
        }
        if cadence.secondary % cadence.presence != 0 {
            return Err(ConfigError::MisalignedCadence {
                presence: cadence.presence,
                secondary: cadence.secondary,
            });
        }

        let mut seen = HashSet::new();
        for (index, entry) in self.campaigns.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::EmptyCampaignName { index });
            }
            let slug = entry.resolved_slug();
            if slug.is_empty() {
                return Err(ConfigError::EmptySlug {
                    name: entry.name.clone(),
                });
            }
            if !seen.insert(slug.clone()) {
                return Err(ConfigError::DuplicateSlug(slug));
            }
        }

        if let Some(index) = self
            .fallback_channels
            .iter()
            .position(|c| c.trim().is_empty())
        {
            return Err(ConfigError::EmptyFallback { index });
        }

        if self.campaigns.is_empty() && self.fallback_channels.is_empty() {
            return Err(ConfigError::NothingToWatch);
        }

        Ok(())
    }

    /// Campaigns in priority order with slugs resolved.
    pub fn campaigns(&self) -> Vec<Campaign> {
        self.campaigns
            .iter()
            .map(|entry| Campaign::new(entry.name.trim(), entry.resolved_slug()))
            .collect()
    }

    pub fn fallback_channels(&self) -> Vec<String> {
        self.fallback_channels
            .iter()
            .map(|c| c.trim().to_string())
            .collect()
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
