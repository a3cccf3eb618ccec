//! Daemon status, channel history and shutdown commands.

use anyhow::Result;
use serde::Deserialize;

use super::http::{base_url, get_json, post_json};

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusResponse {
    agent: String,
    version: String,
    uptime_secs: u64,
    devices: Option<usize>,
    capacity: usize,
    scheduler_running: bool,
    messages_published: usize,
}

#[derive(Deserialize)]
struct MessagesResponse {
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct Message {
    seq: u64,
    topic: String,
    payload: String,
}

#[derive(Deserialize)]
struct ShutdownResponse {
    message: String,
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_status(port: u16) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base_url(port))).await?;

    let devices = resp
        .devices
        .map(|n| n.to_string())
        .unwrap_or_else(|| "busy".to_string());

    println!("═══════════════════════════════════════");
    println!("  lanwake Agent Status");
    println!("═══════════════════════════════════════");
    println!("  Agent      : {} v{}", resp.agent, resp.version);
    println!("  Uptime     : {}s", resp.uptime_secs);
    println!("  Devices    : {} / {}", devices, resp.capacity);
    println!(
        "  Scheduler  : {}",
        if resp.scheduler_running { "running" } else { "stopped" }
    );
    println!("  Messages   : {}", resp.messages_published);

    Ok(())
}

pub async fn cmd_messages(port: u16, since: u64) -> Result<()> {
    let resp: MessagesResponse =
        get_json(&format!("{}/messages?since={}", base_url(port), since)).await?;

    if resp.messages.is_empty() {
        println!("No messages published yet.");
        return Ok(());
    }

    for m in &resp.messages {
        println!("  #{:<5} {}", m.seq, m.topic);
        println!("         {}", m.payload);
    }

    Ok(())
}

pub async fn cmd_shutdown(port: u16) -> Result<()> {
    let resp: ShutdownResponse = post_json(&format!("{}/daemon/shutdown", base_url(port))).await?;
    println!("{}", resp.message);
    Ok(())
}
