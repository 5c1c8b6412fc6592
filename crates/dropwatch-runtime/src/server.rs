//! UDS JSON-RPC server: minimal hand-rolled implementation.
//! Connection-per-request, newline-delimited JSON.

use std::sync::Arc;

use dropwatch_backend::DryRunSession;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

use crate::watcher::Watcher;

/// What the RPC methods act on.
pub struct ServerContext {
    pub watcher: Arc<Watcher>,
    /// Dry-run session, for simulating external drops and navigation.
    pub session: Arc<DryRunSession>,
}

#[derive(Debug, Error)]
pub(crate) enum RpcError {
    #[error("method not found")]
    MethodNotFound,
    #[error("invalid params: {0}")]
    InvalidParams(&'static str),
    #[error("internal error: {0}")]
    Internal(#[from] serde_json::Error),
}

impl RpcError {
    fn code(&self) -> i64 {
        match self {
            Self::MethodNotFound => -32601,
            Self::InvalidParams(_) => -32602,
            Self::Internal(_) => -32603,
        }
    }
}

/// Run the UDS JSON-RPC server.
pub async fn run_server(socket_path: &str, ctx: Arc<ServerContext>) -> anyhow::Result<()> {
    let socket_dir = std::path::Path::new(socket_path)
        .parent()
        .ok_or_else(|| anyhow::anyhow!("invalid socket path"))?;

    std::fs::create_dir_all(socket_dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_dir, std::fs::Permissions::from_mode(0o700))?;
    }

    if std::path::Path::new(socket_path).exists() {
        if tokio::net::UnixStream::connect(socket_path).await.is_err() {
            std::fs::remove_file(socket_path)?;
            tracing::info!("removed stale socket at {socket_path}");
        } else {
            anyhow::bail!("another daemon is already running at {socket_path}");
        }
    }

    let listener = UnixListener::bind(socket_path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!("UDS server listening on {socket_path}");

    loop {
        let (stream, _) = listener.accept().await?;
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, ctx).await {
                tracing::debug!("connection error: {e}");
            }
        });
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    ctx: Arc<ServerContext>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let request: serde_json::Value = serde_json::from_str(line.trim())?;
    let method = request["method"].as_str().unwrap_or("");
    let id = request["id"].clone();

    let response = match dispatch(method, &request["params"], &ctx).await {
        Ok(result) => serde_json::json!({
            "jsonrpc": "2.0",
            "result": result,
            "id": id,
        }),
        Err(e) => serde_json::json!({
            "jsonrpc": "2.0",
            "error": {"code": e.code(), "message": e.to_string()},
            "id": id,
        }),
    };
    let mut resp = serde_json::to_string(&response)?;
    resp.push('\n');
    writer.write_all(resp.as_bytes()).await?;

    Ok(())
}

/// Every method answers with the status as it stands afterwards.
pub(crate) async fn dispatch(
    method: &str,
    params: &serde_json::Value,
    ctx: &ServerContext,
) -> Result<serde_json::Value, RpcError> {
    let watcher = &ctx.watcher;
    match method {
        "status" => {}
        "pause" => {
            tracing::info!("pause requested");
            watcher.stop().await;
        }
        "resume" => {
            if watcher.is_running().await {
                tracing::debug!("resume requested while running");
            } else {
                tracing::info!("resume requested");
                watcher.start().await;
            }
        }
        // Drift is picked up by the next tick's reconciliation.
        "drop_session" => {
            ctx.session.drop_session().await;
        }
        "navigate" => {
            let channel = params["channel"]
                .as_str()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .ok_or(RpcError::InvalidParams("navigate requires a channel"))?;
            ctx.session.navigate(channel).await;
        }
        _ => return Err(RpcError::MethodNotFound),
    }
    Ok(serde_json::to_value(watcher.status())?)
}
