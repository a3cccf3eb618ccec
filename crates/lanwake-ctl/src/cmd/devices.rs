//! Device registry commands.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::http::{base_url, delete_json, get_json, post_json, post_json_body};

// ── Request and response types ────────────────────────────────────────────────

#[derive(Deserialize)]
struct DeviceSummary {
    devices: Vec<DeviceEntry>,
    total: usize,
}

#[derive(Deserialize)]
struct DeviceEntry {
    name: String,
    ip: String,
    status: String,
    enabled: bool,
}

#[derive(Deserialize)]
struct Schedule {
    interval_ms: u32,
    timeout_ms: u32,
    probe_count: u32,
}

#[derive(Deserialize)]
struct DeviceDetail {
    name: String,
    ip: String,
    mac: Option<String>,
    description: Option<String>,
    schedule: Schedule,
    enabled: bool,
    status: String,
    success_count: u64,
    fail_count: u64,
    last_response_ms: u32,
    last_probe_secs: Option<u64>,
    last_success_secs: Option<u64>,
}

#[derive(Serialize)]
struct AddRequest<'a> {
    name: &'a str,
    ip: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mac: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Deserialize)]
struct AddResponse {
    name: String,
    outcome: String,
}

#[derive(Deserialize)]
struct RemoveResponse {
    name: String,
}

/// Tagged command outcome; only the fields the CLI prints.
#[derive(Deserialize)]
struct CommandOutcome {
    outcome: String,
    #[serde(default)]
    device: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    target: Option<String>,
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub async fn cmd_devices(port: u16) -> Result<()> {
    let resp: DeviceSummary = get_json(&format!("{}/devices", base_url(port))).await?;

    if resp.devices.is_empty() {
        println!("No devices registered.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Devices ({})", resp.total);
    println!("═══════════════════════════════════════");
    for d in &resp.devices {
        let flag = if d.enabled { "" } else { " (disabled)" };
        println!("  {:<20} {:<16} {}{}", d.name, d.ip, d.status, flag);
    }

    Ok(())
}

fn since(secs: Option<u64>) -> String {
    secs.map(|s| format!("{}s uptime", s))
        .unwrap_or_else(|| "never".to_string())
}

pub async fn cmd_show(port: u16, name: &str) -> Result<()> {
    let d: DeviceDetail = get_json(&format!("{}/devices/{}", base_url(port), name)).await?;

    println!("  ┌─ {}", d.name);
    println!("  │  ip           : {}", d.ip);
    println!("  │  mac          : {}", d.mac.as_deref().unwrap_or("-"));
    if let Some(desc) = &d.description {
        println!("  │  description  : {}", desc);
    }
    println!("  │  status       : {}", d.status);
    println!("  │  enabled      : {}", d.enabled);
    println!(
        "  │  schedule     : every {}ms, timeout {}ms, {} attempt(s)",
        d.schedule.interval_ms, d.schedule.timeout_ms, d.schedule.probe_count
    );
    println!("  │  probes       : {} ok / {} failed", d.success_count, d.fail_count);
    println!("  │  last rtt     : {}ms", d.last_response_ms);
    println!("  │  last probe   : {}", since(d.last_probe_secs));
    println!("  └─ last success: {}", since(d.last_success_secs));

    Ok(())
}

pub async fn cmd_add(
    port: u16,
    name: &str,
    ip: &str,
    mac: Option<&str>,
    description: Option<&str>,
) -> Result<()> {
    let req = AddRequest {
        name,
        ip,
        mac,
        description,
    };
    let resp: AddResponse = post_json_body(&format!("{}/devices", base_url(port)), &req).await?;
    println!("{} {}.", resp.name, resp.outcome);
    Ok(())
}

pub async fn cmd_remove(port: u16, name: &str) -> Result<()> {
    let resp: RemoveResponse = delete_json(&format!("{}/devices/{}", base_url(port), name)).await?;
    println!("{} removed.", resp.name);
    Ok(())
}

/// `wake`, `enable`, `disable` and `status` against one device.
pub async fn cmd_verb(port: u16, name: &str, verb: &str) -> Result<()> {
    let resp: CommandOutcome =
        post_json(&format!("{}/devices/{}/{}", base_url(port), name, verb)).await?;

    let device = resp.device.as_deref().unwrap_or(name);
    match resp.outcome.as_str() {
        "wake_sent" => println!(
            "Wake packet sent for {} to {}.",
            device,
            resp.target.as_deref().unwrap_or("broadcast")
        ),
        "status" => println!("{}: {}", device, resp.status.as_deref().unwrap_or("unknown")),
        other => println!("{}: {}", device, other),
    }
    Ok(())
}
