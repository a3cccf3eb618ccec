//! /messages handlers: both directions of the messaging channel.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use lanwake_services::{CommandOutcome, Published};

use super::{engine_error, ApiState};

// ── /messages (GET) ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MessagesQuery {
    /// Only messages with a higher sequence number.
    #[serde(default)]
    pub since: u64,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Published>,
}

pub async fn handle_get_messages(
    State(state): State<ApiState>,
    Query(query): Query<MessagesQuery>,
) -> Json<MessagesResponse> {
    let messages = state
        .bus
        .since(query.since)
        .into_iter()
        .filter(|m| query.topic.as_ref().map_or(true, |t| *t == m.topic))
        .collect();
    Json(MessagesResponse { messages })
}

// ── /messages (POST) ──────────────────────────────────────────────────────────

/// An inbound channel message, as a broker would deliver it.
#[derive(Deserialize)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: String,
}

pub async fn handle_inbound_message(
    State(state): State<ApiState>,
    Json(msg): Json<InboundMessage>,
) -> Result<Json<CommandOutcome>, (StatusCode, String)> {
    tracing::debug!(topic = %msg.topic, "inbound message");
    let outcome = state
        .router
        .handle_message(&msg.topic, &msg.payload)
        .await
        .map_err(engine_error)?;
    Ok(Json(outcome))
}
