//! /wake and /probe handlers: registry-free wake and one-off probes.

use std::net::Ipv4Addr;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use lanwake_core::MacAddr;
use lanwake_services::{ProbeOutcome, Prober, WakeReceipt};

use super::{engine_error, ApiState};

/// Upper bound on a one-off probe so a request cannot pin a handler.
const MAX_PROBE_TIMEOUT_MS: u64 = 30_000;

// ── /wake (POST) ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WakeRequest {
    pub mac: String,
    #[serde(default)]
    pub broadcast: Option<Ipv4Addr>,
}

pub async fn handle_wake(
    State(state): State<ApiState>,
    Json(req): Json<WakeRequest>,
) -> Result<Json<WakeReceipt>, (StatusCode, String)> {
    let mac: MacAddr = req
        .mac
        .parse()
        .map_err(|e: lanwake_core::WireError| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let receipt = state
        .dispatcher
        .wake_mac(mac, req.broadcast)
        .map_err(engine_error)?;
    Ok(Json(receipt))
}

// ── /probe (POST) ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ProbeRequest {
    pub address: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Serialize)]
pub struct ProbeResponse {
    pub address: String,
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
}

pub async fn handle_probe(
    State(state): State<ApiState>,
    Json(req): Json<ProbeRequest>,
) -> Json<ProbeResponse> {
    let default_ms = u64::from(state.registry.defaults().timeout_ms);
    let timeout_ms = req
        .timeout_ms
        .filter(|ms| *ms > 0)
        .unwrap_or(default_ms)
        .min(MAX_PROBE_TIMEOUT_MS);

    let outcome = state
        .prober
        .probe(&req.address, Duration::from_millis(timeout_ms))
        .await;
    tracing::debug!(address = %req.address, reachable = outcome.reachable, "one-off probe");

    Json(ProbeResponse {
        address: req.address,
        outcome,
    })
}
