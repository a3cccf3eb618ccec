//! /devices handlers: registry administration and per-device commands.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use lanwake_core::message::DeviceSummary;
use lanwake_services::{AddOutcome, CommandOutcome, EndpointView, NewEndpoint, Schedule};

use super::{engine_error, ApiState};

// ── /devices (GET) ────────────────────────────────────────────────────────────

pub async fn handle_devices(
    State(state): State<ApiState>,
) -> Result<Json<DeviceSummary>, (StatusCode, String)> {
    let summary = state.registry.summary().await.map_err(engine_error)?;
    Ok(Json(summary))
}

// ── /devices (POST) ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct AddResponse {
    pub name: String,
    pub outcome: AddOutcome,
}

pub async fn handle_device_add(
    State(state): State<ApiState>,
    Json(req): Json<NewEndpoint>,
) -> Result<(StatusCode, Json<AddResponse>), (StatusCode, String)> {
    let name = req.name.clone();
    let outcome = state.registry.add(req).await.map_err(engine_error)?;

    let status = match outcome {
        AddOutcome::Added => StatusCode::CREATED,
        AddOutcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(AddResponse { name, outcome })))
}

// ── /devices/{name} (GET, DELETE) ─────────────────────────────────────────────

pub async fn handle_device_get(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<EndpointView>, (StatusCode, String)> {
    let view = state.registry.get(&name).await.map_err(engine_error)?;
    Ok(Json(view))
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub name: String,
    pub removed: bool,
}

pub async fn handle_device_remove(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<Json<RemoveResponse>, (StatusCode, String)> {
    state.registry.remove(&name).await.map_err(engine_error)?;
    Ok(Json(RemoveResponse { name, removed: true }))
}

// ── /devices/{name}/{verb} (POST) ─────────────────────────────────────────────

pub async fn handle_device_command(
    State(state): State<ApiState>,
    Path((name, verb)): Path<(String, String)>,
) -> Result<Json<CommandOutcome>, (StatusCode, String)> {
    let outcome = state.router.handle(&name, &verb).await.map_err(engine_error)?;
    Ok(Json(outcome))
}

// ── /devices/{name}/schedule (PUT) ────────────────────────────────────────────

pub async fn handle_device_schedule(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(schedule): Json<Schedule>,
) -> Result<Json<Schedule>, (StatusCode, String)> {
    let applied = state
        .registry
        .update_schedule(&name, schedule)
        .await
        .map_err(engine_error)?;
    Ok(Json(applied))
}
