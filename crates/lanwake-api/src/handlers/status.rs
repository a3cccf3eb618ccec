//! /status and /daemon/shutdown handlers.

use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::ApiState;

// ── /status ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub agent: String,
    pub version: String,
    pub uptime_secs: u64,
    /// `None` when the registry lock could not be taken in time.
    pub devices: Option<usize>,
    pub capacity: usize,
    pub scheduler_running: bool,
    pub messages_published: usize,
}

pub async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    let devices = state.registry.len().await.ok();

    Json(StatusResponse {
        agent: state.agent_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.registry.uptime_secs(),
        devices,
        capacity: state.registry.capacity(),
        scheduler_running: state.scheduler_running.load(Ordering::SeqCst),
        messages_published: state.bus.len(),
    })
}

// ── /daemon/shutdown ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ShutdownResponse {
    pub message: String,
}

pub async fn handle_shutdown(State(state): State<ApiState>) -> Json<ShutdownResponse> {
    tracing::info!("shutdown requested via API");

    let tx = state.shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        let _ = tx.send(());
    });

    Json(ShutdownResponse {
        message: "Shutdown initiated".to_string(),
    })
}
