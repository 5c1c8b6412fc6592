//! dropwatch: stream selection scheduler daemon and control CLI.
//! Single process: watcher, selection engine and UDS server run in-process.

use clap::Parser;

mod cli;
mod client;
mod daemon;
mod selection;
mod server;
mod settings;
mod switch;
#[cfg(test)]
mod testing;
mod watcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    let socket_path = args.socket_path.unwrap_or_else(cli::default_socket_path);

    match args.command {
        cli::Command::Run(opts) => {
            let filter = std::env::var("DROPWATCH_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string());
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
                .init();

            tracing::info!("dropwatch daemon starting");
            daemon::run_daemon(opts, &socket_path).await?;
        }
        cli::Command::Status(opts) => {
            client::cmd_status(&socket_path, opts.json).await?;
        }
        cli::Command::Pause => {
            client::cmd_control(&socket_path, "pause", serde_json::json!({})).await?;
        }
        cli::Command::Resume => {
            client::cmd_control(&socket_path, "resume", serde_json::json!({})).await?;
        }
        cli::Command::SimulateDrop => {
            client::cmd_control(&socket_path, "drop_session", serde_json::json!({})).await?;
        }
        cli::Command::SimulateNavigate(opts) => {
            let params = serde_json::json!({ "channel": opts.channel });
            client::cmd_control(&socket_path, "navigate", params).await?;
        }
    }

    Ok(())
}
