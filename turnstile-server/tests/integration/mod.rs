pub mod multi_peer_tests;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::Level;

use turnstile_server::{Gateway, GatewayConfig, MediaEngine, serve};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Config with short timings so queue movement shows up quickly.
pub fn test_config(max_connections: usize) -> GatewayConfig {
    GatewayConfig {
        max_connections,
        poll_interval: Duration::from_millis(50),
        offer_timeout: Duration::from_secs(2),
        connect_timeout: Duration::from_secs(10),
        ice_servers: vec![],
        ..GatewayConfig::default()
    }
}

pub fn create_test_gateway(config: GatewayConfig, engine: impl MediaEngine) -> Gateway {
    Gateway::new(config, Arc::new(engine))
}

/// Serves `gateway` on an ephemeral port. Dropping the sender stops it.
pub async fn spawn_test_server(gateway: Gateway) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown = async {
            let _ = stop_rx.await;
        };
        if let Err(e) = serve(listener, gateway, shutdown).await {
            tracing::error!("Test server failed: {:#}", e);
        }
    });

    (addr, stop_tx)
}
