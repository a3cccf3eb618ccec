//! Registry-free wake and probe commands.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::http::{base_url, post_json_body};

#[derive(Serialize)]
struct WakeRequest<'a> {
    mac: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    broadcast: Option<&'a str>,
}

#[derive(Deserialize)]
struct WakeReceipt {
    mac: String,
    target: String,
    bytes: usize,
}

#[derive(Serialize)]
struct ProbeRequest<'a> {
    address: &'a str,
}

#[derive(Deserialize)]
struct ProbeResponse {
    address: String,
    reachable: bool,
    response_time_ms: u32,
}

pub async fn cmd_wake_mac(port: u16, mac: &str, broadcast: Option<&str>) -> Result<()> {
    let req = WakeRequest { mac, broadcast };
    let resp: WakeReceipt = post_json_body(&format!("{}/wake", base_url(port)), &req).await?;
    println!("Sent {} bytes to {} for {}.", resp.bytes, resp.target, resp.mac);
    Ok(())
}

pub async fn cmd_probe(port: u16, address: &str) -> Result<()> {
    let req = ProbeRequest { address };
    let resp: ProbeResponse = post_json_body(&format!("{}/probe", base_url(port)), &req).await?;
    if resp.reachable {
        println!("{} is reachable ({}ms).", resp.address, resp.response_time_ms);
    } else {
        println!("{} is unreachable.", resp.address);
    }
    Ok(())
}
