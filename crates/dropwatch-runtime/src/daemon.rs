//! Daemon wiring: builds the collaborators, starts the watcher and the UDS
//! server, waits for a shutdown signal.

use std::sync::Arc;

use dropwatch_backend::{
    CampaignOracle, DryRunSession, FixtureOracle, GatedPresence, LoggingPresenceActions,
    PresenceSimulator, SessionProvider,
};
use dropwatch_core::{WatchStatus, WatcherConfig};
use tokio::sync::watch;

use crate::cli::RunOpts;
use crate::selection::SelectionEngine;
use crate::server::{self, ServerContext};
use crate::settings;
use crate::switch::SwitchController;
use crate::watcher::{Watcher, WatcherCore};

/// Assemble a watcher over the dry-run collaborators. The session handle is
/// shared so drift can be simulated from outside the scheduler.
pub fn build_watcher(
    config: &WatcherConfig,
    opts: &RunOpts,
    session: Arc<DryRunSession>,
) -> Watcher {
    let oracle: Arc<dyn CampaignOracle> = Arc::new(FixtureOracle::new(&opts.fixture));
    let session: Arc<dyn SessionProvider> = session;
    let presence: Arc<dyn PresenceSimulator> =
        Arc::new(GatedPresence::new(LoggingPresenceActions::new()));

    let engine = SelectionEngine::new(
        oracle,
        config.campaigns(),
        config.fallback_channels(),
        config.query_timeout(),
    );
    let switch = SwitchController::new(session, presence);
    let core = WatcherCore::new(engine, switch, config.cadence);
    Watcher::new(core, config.tick_period())
}

/// Run the daemon until ctrl-c, SIGTERM, or the server exits.
pub async fn run_daemon(opts: RunOpts, socket_path: &str) -> anyhow::Result<()> {
    let config = settings::load_config(&opts)?;
    tracing::info!(
        campaigns = config.campaigns.len(),
        fallbacks = config.fallback_channels.len(),
        tick_ms = config.tick_period_ms,
        fixture = %opts.fixture.display(),
        "configuration ready"
    );

    let session = Arc::new(DryRunSession::new());
    let watcher = Arc::new(build_watcher(&config, &opts, Arc::clone(&session)));

    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to register SIGTERM handler: {e}"))?;

    let server_ctx = Arc::new(ServerContext {
        watcher: Arc::clone(&watcher),
        session,
    });
    let server_socket = socket_path.to_string();
    let mut server_handle = tokio::spawn(async move {
        if let Err(e) = server::run_server(&server_socket, server_ctx).await {
            tracing::error!("UDS server error: {e}");
        }
    });

    let status_log = tokio::spawn(log_status_changes(watcher.subscribe()));
    watcher.start().await;

    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            tokio::select! {
                _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            tracing::info!("received ctrl-c, shutting down");
        }
    };

    tokio::select! {
        () = shutdown => {}
        _ = &mut server_handle => {
            tracing::warn!("UDS server exited unexpectedly");
        }
    }

    watcher.stop().await;
    server_handle.abort();
    status_log.abort();
    let _ = std::fs::remove_file(socket_path);
    tracing::info!("daemon stopped");
    Ok(())
}

/// Log one line whenever the watched stream or its source changes.
async fn log_status_changes(mut rx: watch::Receiver<WatchStatus>) {
    let mut last = String::new();
    while rx.changed().await.is_ok() {
        let summary = rx.borrow_and_update().summary();
        if summary != last {
            tracing::info!("{summary}");
            last = summary;
        }
    }
}
