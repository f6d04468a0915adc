use crate::gateway::Gateway;
use crate::signaling::ws_handler;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    queued: usize,
    session_active: bool,
}

pub fn router(gateway: Gateway) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/healthz", get(health_handler))
        .with_state(gateway)
}

/// Serves signaling connections on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, gateway: Gateway, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("listener has no address")?;
    info!("Starting WebSocket server on ws://{}", addr);

    axum::serve(
        listener,
        router(gateway).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("signaling server failed")?;

    info!("Server closed");
    Ok(())
}

async fn health_handler(State(gateway): State<Gateway>) -> impl IntoResponse {
    Json(Health {
        status: "ok",
        queued: gateway.queue().len(),
        session_active: gateway.gate().is_held(),
    })
}
