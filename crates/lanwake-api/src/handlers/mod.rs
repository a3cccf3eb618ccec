//! HTTP API handlers: exposes the engine as JSON.

pub mod devices;
pub mod messages;
pub mod status;
pub mod wake;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::http::StatusCode;

use lanwake_core::EngineError;
use lanwake_services::{CommandRouter, MessageBus, Registry, TcpProber, WakeDispatcher};

#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<Registry>,
    pub router: Arc<CommandRouter>,
    pub dispatcher: Arc<WakeDispatcher>,
    /// Used for one-off probes; the scheduler owns its own copy.
    pub prober: TcpProber,
    pub bus: MessageBus,
    pub agent_name: String,
    /// Turns false once the scheduler loop has exited.
    pub scheduler_running: Arc<AtomicBool>,
    /// Shutdown broadcast sender: signals graceful daemon shutdown.
    pub shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Map an engine error onto an HTTP status with the error text as body.
fn engine_error(e: EngineError) -> (StatusCode, String) {
    let status = match &e {
        EngineError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::CapacityExceeded { .. } => StatusCode::INSUFFICIENT_STORAGE,
        EngineError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::Disabled(_) => StatusCode::CONFLICT,
        EngineError::Transport(_) => StatusCode::BAD_GATEWAY,
    };
    (status, e.to_string())
}

// Re-export handler functions for use in router setup.
pub use devices::{
    handle_device_add, handle_device_command, handle_device_get, handle_device_remove,
    handle_device_schedule, handle_devices,
};
pub use messages::{handle_get_messages, handle_inbound_message};
pub use status::{handle_shutdown, handle_status};
pub use wake::{handle_probe, handle_wake};
