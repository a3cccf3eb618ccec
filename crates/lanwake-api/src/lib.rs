pub mod handlers;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

/// All routes, without the `/api` prefix.
pub fn routes(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(handlers::handle_status))
        .route(
            "/devices",
            get(handlers::handle_devices).post(handlers::handle_device_add),
        )
        .route(
            "/devices/{name}",
            get(handlers::handle_device_get).delete(handlers::handle_device_remove),
        )
        .route("/devices/{name}/schedule", put(handlers::handle_device_schedule))
        .route("/devices/{name}/{verb}", post(handlers::handle_device_command))
        .route("/wake", post(handlers::handle_wake))
        .route("/probe", post(handlers::handle_probe))
        .route(
            "/messages",
            get(handlers::handle_get_messages).post(handlers::handle_inbound_message),
        )
        .route("/daemon/shutdown", post(handlers::handle_shutdown))
        .with_state(state)
}

pub async fn serve(state: ApiState, port: u16) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new().nest("/api", routes(state)).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!(port, "API listening on 127.0.0.1");
    axum::serve(listener, app).await?;
    Ok(())
}
