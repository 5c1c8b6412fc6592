//! UDS JSON-RPC client for CLI subcommands.

use dropwatch_core::WatchStatus;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

pub(crate) async fn rpc_call(
    socket_path: &str,
    method: &str,
    params: serde_json::Value,
) -> anyhow::Result<serde_json::Value> {
    let stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot connect to daemon at {socket_path}: {e}"))?;

    let (reader, mut writer) = stream.into_split();

    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1,
    });
    let mut req = serde_json::to_string(&request)?;
    req.push('\n');
    writer.write_all(req.as_bytes()).await?;
    writer.shutdown().await?;

    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let response: serde_json::Value = serde_json::from_str(line.trim())?;

    if let Some(error) = response.get("error") {
        anyhow::bail!("RPC error: {error}");
    }

    Ok(response["result"].clone())
}

/// `dropwatch status`: summary line plus timestamps, or raw JSON.
pub async fn cmd_status(socket_path: &str, json: bool) -> anyhow::Result<()> {
    let status = rpc_call(socket_path, "status", serde_json::json!({})).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{}", format_status(&status)?);
    }
    Ok(())
}

/// `dropwatch pause`, `resume` and the dry-run drift commands.
pub async fn cmd_control(
    socket_path: &str,
    method: &str,
    params: serde_json::Value,
) -> anyhow::Result<()> {
    let status = rpc_call(socket_path, method, params).await?;
    println!("{}", format_status(&status)?);
    Ok(())
}

/// Pure formatting logic for status output, separated for testability.
pub(crate) fn format_status(value: &serde_json::Value) -> anyhow::Result<String> {
    let status: WatchStatus = serde_json::from_value(value.clone())?;

    let mut out = status.to_string();
    let tick = status
        .tick
        .map_or_else(|| "-".to_string(), |t| t.to_string());
    out.push_str(&format!("\n  tick:        {tick}"));
    for (label, at) in [
        ("last scan:  ", status.last_scan_at),
        ("last switch:", status.last_switch_at),
    ] {
        let at = at.map_or_else(
            || "-".to_string(),
            |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        out.push_str(&format!("\n  {label} {at}"));
    }
    Ok(out)
}
