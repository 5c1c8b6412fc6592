//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dropwatch",
    about = "Keeps a viewing session on the highest-priority live reward campaign"
)]
pub struct Cli {
    /// UDS socket path (default: $XDG_RUNTIME_DIR/dropwatch/dropwatch.sock)
    #[arg(long, short = 's', global = true)]
    pub socket_path: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the watcher daemon (scheduler + UDS server)
    Run(RunOpts),
    /// Show what the daemon is watching
    Status(StatusOpts),
    /// Stop the watcher and release the session
    Pause,
    /// Restart the watcher
    Resume,
    /// Dry run: close the session as if it were lost externally
    SimulateDrop,
    /// Dry run: point the session at another channel behind the watcher's back
    SimulateNavigate(NavigateOpts),
}

#[derive(clap::Args, Debug, Default)]
pub struct RunOpts {
    /// Config file (default: $XDG_CONFIG_HOME/dropwatch/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON fixture answering campaign queries for the dry-run oracle
    #[arg(long)]
    pub fixture: PathBuf,

    /// Base tick period in milliseconds (overrides the config file)
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Per-query oracle timeout in milliseconds (overrides the config file)
    #[arg(long)]
    pub query_timeout_ms: Option<u64>,

    /// Extra fallback channel, appended after configured ones (repeatable)
    #[arg(long = "fallback", value_name = "CHANNEL")]
    pub fallbacks: Vec<String>,
}

#[derive(clap::Args, Debug, Default)]
pub struct StatusOpts {
    /// Print the raw status object as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct NavigateOpts {
    /// Channel the session should end up showing
    pub channel: String,
}

/// Default socket path using $USER for per-user isolation.
pub fn default_socket_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return format!("{dir}/dropwatch/dropwatch.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    format!("/tmp/dropwatch-{user}/dropwatch.sock")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_parses_overrides() {
        let cli = Cli::parse_from([
            "dropwatch",
            "run",
            "--fixture",
            "fixture.json",
            "--tick-ms",
            "250",
            "--fallback",
            "a",
            "--fallback",
            "b",
        ]);
        let Command::Run(opts) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(opts.fixture, PathBuf::from("fixture.json"));
        assert_eq!(opts.tick_ms, Some(250));
        assert_eq!(opts.fallbacks, vec!["a", "b"]);
        assert!(opts.config.is_none());
    }

    #[test]
    fn run_requires_fixture() {
        assert!(Cli::try_parse_from(["dropwatch", "run"]).is_err());
    }

    #[test]
    fn global_socket_path_after_subcommand() {
        let cli = Cli::parse_from(["dropwatch", "status", "--json", "-s", "/tmp/x.sock"]);
        assert_eq!(cli.socket_path.as_deref(), Some("/tmp/x.sock"));
        assert!(matches!(cli.command, Command::Status(StatusOpts { json: true })));
    }

    #[test]
    fn simulate_navigate_takes_channel() {
        let cli = Cli::parse_from(["dropwatch", "simulate-navigate", "elsewhere"]);
        let Command::SimulateNavigate(opts) = cli.command else {
            panic!("expected simulate-navigate");
        };
        assert_eq!(opts.channel, "elsewhere");
        assert!(Cli::try_parse_from(["dropwatch", "simulate-navigate"]).is_err());
        assert!(matches!(
            Cli::parse_from(["dropwatch", "simulate-drop"]).command,
            Command::SimulateDrop
        ));
    }

    #[test]
    fn default_socket_path_ends_with_sock() {
        assert!(default_socket_path().ends_with("/dropwatch.sock"));
    }
}
