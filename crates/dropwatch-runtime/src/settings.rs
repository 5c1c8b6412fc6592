//! Config file resolution and CLI overrides.

use std::path::{Path, PathBuf};

use anyhow::Context;
use dropwatch_core::WatcherConfig;

use crate::cli::RunOpts;

/// `$XDG_CONFIG_HOME/dropwatch/config.toml`, else `~/.config/dropwatch/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME")
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir).join("dropwatch/config.toml"));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config/dropwatch/config.toml"))
}

pub fn load_config(opts: &RunOpts) -> anyhow::Result<WatcherConfig> {
    load_config_at(opts.config.as_deref(), default_config_path(), opts)
}

/// An explicit path must exist; a missing default path falls back to
/// built-in defaults.
fn load_config_at(
    explicit: Option<&Path>,
    default: Option<PathBuf>,
    opts: &RunOpts,
) -> anyhow::Result<WatcherConfig> {
    let mut config = match explicit {
        Some(path) => read_config(path)?,
        None => match default {
            Some(path) if path.exists() => read_config(&path)?,
            _ => {
                tracing::info!("no config file found, using defaults");
                WatcherConfig::default()
            }
        },
    };

    if let Some(tick_ms) = opts.tick_ms {
        config.tick_period_ms = tick_ms;
    }
    if let Some(timeout_ms) = opts.query_timeout_ms {
        config.query_timeout_ms = timeout_ms;
    }
    config.fallback_channels.extend(opts.fallbacks.iter().cloned());

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn read_config(path: &Path) -> anyhow::Result<WatcherConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    let config = WatcherConfig::from_toml_str(&text)
        .with_context(|| format!("cannot parse config {}", path.display()))?;
    tracing::info!(path = %path.display(), "config loaded");
    Ok(config)
}
