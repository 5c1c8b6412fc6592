//! Campaign oracle trait.

use async_trait::async_trait;

use crate::error::BackendError;

/// Answers the four questions the selection engine asks about campaigns and
/// channels. Implementations own their own scraping/API details and may be
/// arbitrarily slow; callers bound every query with a timeout.
#[async_trait]
pub trait CampaignOracle: Send + Sync {
    /// Slugs of campaigns that are currently running.
    async fn list_active_campaign_slugs(&self) -> Result<Vec<String>, BackendError>;

    /// True when every reward of the campaign has already been claimed.
    async fn is_reward_claimed(&self, slug: &str) -> Result<bool, BackendError>;

    /// A live channel that progresses the campaign, if any.
    async fn resolve_channel_for_slug(&self, slug: &str) -> Result<Option<String>, BackendError>;

    async fn is_channel_live(&self, channel: &str) -> Result<bool, BackendError>;
}
