use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Campaign ─────────────────────────────────────────────────────

/// A reward campaign eligible for farming while active.
///
/// Position in the configured list encodes priority (index 0 = highest).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Campaign {
    /// Display name.
    pub name: String,
    /// Stable identifier used as the oracle lookup key.
    pub slug: String,
}

impl Campaign {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
        }
    }
}

// ─── Selection ────────────────────────────────────────────────────

/// Where a selected channel came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionSource {
    /// Resolved from an active, unclaimed campaign.
    Campaign { slug: String },
    /// A live channel from the fallback list.
    Fallback,
}

impl SelectionSource {
    /// Farming slug carried by this source, if any.
    pub fn slug(&self) -> Option<&str> {
        match self {
            Self::Campaign { slug } => Some(slug),
            Self::Fallback => None,
        }
    }
}

impl fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Campaign { slug } => write!(f, "campaign:{slug}"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Outcome of a selection pass: the channel to watch and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub channel: String,
    pub source: SelectionSource,
}

impl Selection {
    pub fn campaign(slug: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            source: SelectionSource::Campaign { slug: slug.into() },
        }
    }

    pub fn fallback(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            source: SelectionSource::Fallback,
        }
    }
}

// ─── Status ───────────────────────────────────────────────────────

/// Snapshot of the scheduler, published after every tick and lifecycle change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchStatus {
    /// Whether the base timer is currently scheduled.
    pub running: bool,
    /// Cached belief about the attached channel.
    pub current_stream: Option<String>,
    /// Source of `current_stream`; `None` when nothing is attached.
    pub source: Option<SelectionSource>,
    pub farming_slug: Option<String>,
    /// Display name of the farmed campaign.
    pub farming_campaign: Option<String>,
    /// Last processed tick (`None` before the first fire).
    pub tick: Option<u64>,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub last_switch_at: Option<DateTime<Utc>>,
}

impl WatchStatus {
    /// One-line human summary.
    pub fn summary(&self) -> String {
        match (&self.current_stream, &self.source) {
            (None, _) => "no stream selected".to_string(),
            (Some(channel), Some(SelectionSource::Campaign { slug })) => {
                let label = self.farming_campaign.as_deref().unwrap_or(slug);
                format!("farming {label} ({slug}) on {channel}")
            }
            (Some(channel), Some(SelectionSource::Fallback)) => {
                format!("watching fallback {channel}")
            }
            (Some(channel), None) => format!("watching {channel}"),
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())?;
        if !self.running {
            f.write_str(" [paused]")?;
        }
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_source_display() {
        let campaign = SelectionSource::Campaign {
            slug: "rust".into(),
        };
        assert_eq!(campaign.to_string(), "campaign:rust");
        assert_eq!(SelectionSource::Fallback.to_string(), "fallback");
    }

    #[test]
    fn selection_source_serde_tagged() {
        let json = serde_json::to_value(SelectionSource::Campaign {
            slug: "rust".into(),
        })
        .expect("serialize");
        assert_eq!(json["kind"], "campaign");
        assert_eq!(json["slug"], "rust");
    }

    #[test]
    fn summary_without_stream() {
        let status = WatchStatus::default();
        assert_eq!(status.summary(), "no stream selected");
        assert_eq!(status.to_string(), "no stream selected [paused]");
    }

    #[test]
    fn summary_farming_uses_display_name() {
        let status = WatchStatus {
            running: true,
            current_stream: Some("channelX".into()),
            source: Some(SelectionSource::Campaign {
                slug: "rust".into(),
            }),
            farming_slug: Some("rust".into()),
            farming_campaign: Some("Rust".into()),
            ..WatchStatus::default()
        };
        assert_eq!(status.to_string(), "farming Rust (rust) on channelX");
    }

    #[test]
    fn summary_fallback() {
        let status = WatchStatus {
            running: true,
            current_stream: Some("b".into()),
            source: Some(SelectionSource::Fallback),
            ..WatchStatus::default()
        };
        assert_eq!(status.summary(), "watching fallback b");
    }

    #[test]
    fn selection_constructors() {
        let sel = Selection::campaign("rust", "channelX");
        assert_eq!(sel.source.slug(), Some("rust"));
        assert_eq!(Selection::fallback("a").source.slug(), None);
    }
}
