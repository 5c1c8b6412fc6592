//! Stream selection engine: priority campaigns first, fallbacks second.
//!
//! Every oracle query is bounded by `query_timeout`. A failed or timed-out
//! query counts as "no channel for this candidate" and evaluation moves on
//! to the next slug or fallback; one flaky lookup never aborts a scan.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dropwatch_backend::{BackendError, CampaignOracle};
use dropwatch_core::{Campaign, Selection};

pub struct SelectionEngine {
    oracle: Arc<dyn CampaignOracle>,
    /// Priority order, index 0 first.
    campaigns: Vec<Campaign>,
    fallbacks: Vec<String>,
    query_timeout: Duration,
    /// Campaign currently pursued; enables the cheap targeted re-check.
    farming_slug: Option<String>,
}

impl SelectionEngine {
    pub fn new(
        oracle: Arc<dyn CampaignOracle>,
        campaigns: Vec<Campaign>,
        fallbacks: Vec<String>,
        query_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            campaigns,
            fallbacks,
            query_timeout,
            farming_slug: None,
        }
    }

    pub fn farming_slug(&self) -> Option<&str> {
        self.farming_slug.as_deref()
    }

    pub fn campaign(&self, slug: &str) -> Option<&Campaign> {
        self.campaigns.iter().find(|c| c.slug == slug)
    }

    /// Forget the farmed campaign, e.g. after its channel could not be
    /// attached or the session was lost.
    pub fn release_farming(&mut self) {
        if let Some(slug) = self.farming_slug.take() {
            tracing::debug!(slug = %slug, "farming released");
        }
    }

    /// Periodic rescan: re-check the farmed campaign when there is one, and
    /// only run a full scan if that yields nothing.
    pub async fn rescan(&mut self) -> Option<Selection> {
        if let Some(selection) = self.recheck().await {
            return Some(selection);
        }
        self.full_scan().await
    }

    /// Resolve only the farmed campaign. Clears the farming slug when the
    /// campaign no longer yields a channel.
    pub async fn recheck(&mut self) -> Option<Selection> {
        let slug = self.farming_slug.clone()?;

        let channel = self
            .ask(
                format!("resolve_channel_for_slug({slug})"),
                self.oracle.resolve_channel_for_slug(&slug),
            )
            .await
            .flatten();

        match channel {
            Some(channel) => {
                tracing::debug!(slug = %slug, channel = %channel, "farmed campaign still has a channel");
                Some(Selection::campaign(slug, channel))
            }
            None => {
                tracing::info!(slug = %slug, "farmed campaign yielded no channel, running full scan");
                self.farming_slug = None;
                None
            }
        }
    }

    /// Full priority scan. First resolvable campaign wins; otherwise the
    /// first live fallback; otherwise `None`.
    pub async fn full_scan(&mut self) -> Option<Selection> {
        self.farming_slug = None;

        let active = self
            .ask(
                "list_active_campaign_slugs".to_string(),
                self.oracle.list_active_campaign_slugs(),
            )
            .await
            .unwrap_or_default();

        if let Some(selection) = self.scan_campaigns(&active).await {
            self.farming_slug = selection.source.slug().map(str::to_string);
            return Some(selection);
        }

        tracing::info!("no campaign yielded a channel, trying fallbacks");
        if let Some(selection) = self.scan_fallbacks().await {
            return Some(selection);
        }

        tracing::warn!("no stream available");
        None
    }

    async fn scan_campaigns(&self, active: &[String]) -> Option<Selection> {
        for campaign in &self.campaigns {
            let slug = campaign.slug.as_str();
            if !active.iter().any(|s| s == slug) {
                continue;
            }

            let claimed = self
                .ask(
                    format!("is_reward_claimed({slug})"),
                    self.oracle.is_reward_claimed(slug),
                )
                .await;
            match claimed {
                Some(false) => {}
                Some(true) => {
                    tracing::debug!(slug = %slug, "reward already claimed, skipping");
                    continue;
                }
                None => continue,
            }

            let channel = self
                .ask(
                    format!("resolve_channel_for_slug({slug})"),
                    self.oracle.resolve_channel_for_slug(slug),
                )
                .await
                .flatten();
            if let Some(channel) = channel {
                tracing::info!(campaign = %campaign.name, slug = %slug, channel = %channel, "campaign selected");
                return Some(Selection::campaign(slug, channel));
            }
            tracing::debug!(slug = %slug, "active campaign has no channel");
        }
        None
    }

    async fn scan_fallbacks(&self) -> Option<Selection> {
        for channel in &self.fallbacks {
            let live = self
                .ask(
                    format!("is_channel_live({channel})"),
                    self.oracle.is_channel_live(channel),
                )
                .await;
            if live == Some(true) {
                tracing::info!(channel = %channel, "fallback selected");
                return Some(Selection::fallback(channel.clone()));
            }
        }
        None
    }

    /// Run one oracle query under the timeout, degrading failures to `None`.
    async fn ask<T, F>(&self, operation: String, query: F) -> Option<T>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                tracing::warn!("{operation} failed: {e}");
                None
            }
            Err(_) => {
                tracing::warn!("{}", BackendError::timeout(operation, self.query_timeout));
                None
            }
        }
    }
}
